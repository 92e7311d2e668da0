use std::cmp::Ordering;

use crate::entities::patient::PatientRecord;
use crate::entities::trial::TrialRecord;
use crate::utils::location::split_location;

/// Ranked output is truncated to this many trials.
pub(crate) const MAX_RESULTS: usize = 8;

const LOCATION_JOIN: &str = " | ";
const LATE_PHASE_MARKERS: [&str; 4] = ["phase ii", "phase iii", "phase 2", "phase 3"];

/// Additive relevance score for one trial against the patient record.
///
/// +2 when the diagnosis and a trial condition contain each other
/// (case-insensitive substring, either direction), +1 when the patient's city
/// or region token appears in the trial's locations, +1 for a late-phase
/// (II/III) trial. All terms independent; never fails.
pub(crate) fn score_trial(trial: &TrialRecord, patient: &PatientRecord) -> u32 {
    let mut score = 0;

    if let Some(diagnosis) = patient.diagnosis.as_deref() {
        let diagnosis = diagnosis.to_lowercase();
        let matches_condition = trial.conditions.iter().any(|condition| {
            let condition = condition.trim().to_lowercase();
            !condition.is_empty()
                && (condition.contains(&diagnosis) || diagnosis.contains(&condition))
        });
        if matches_condition {
            score += 2;
        }
    }

    if !trial.locations.is_empty() {
        if let Some(raw) = patient.location.as_deref() {
            let tokens = split_location(raw);
            let haystack = trial.locations.join(LOCATION_JOIN).to_lowercase();
            let hit = [tokens.city, tokens.region]
                .into_iter()
                .flatten()
                .any(|token| haystack.contains(&token.to_lowercase()));
            if hit {
                score += 1;
            }
        }
    }

    if let Some(phase) = trial.phase.as_deref() {
        let phase = phase.to_lowercase();
        if LATE_PHASE_MARKERS.iter().any(|marker| phase.contains(marker)) {
            score += 1;
        }
    }

    score
}

/// Annotates every trial with its score and returns a new ordering: score
/// descending, recruiting trials ahead of score-equal non-recruiting ones,
/// original order otherwise (the sort is stable), truncated to
/// [`MAX_RESULTS`].
pub(crate) fn rank_trials(
    patient: &PatientRecord,
    trials: Vec<TrialRecord>,
) -> Vec<TrialRecord> {
    let mut ranked: Vec<TrialRecord> = trials
        .into_iter()
        .map(|mut trial| {
            trial.score = Some(score_trial(&trial, patient));
            trial
        })
        .collect();

    ranked.sort_by(|a, b| {
        let by_score = b.score.cmp(&a.score);
        if by_score != Ordering::Equal {
            return by_score;
        }
        is_recruiting(&b.status).cmp(&is_recruiting(&a.status))
    });
    ranked.truncate(MAX_RESULTS);
    ranked
}

fn is_recruiting(status: &str) -> bool {
    status.to_lowercase().contains("recruit")
}
