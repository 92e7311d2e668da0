//! The trial matching pipeline: normalize → fetch candidates → rank.

use crate::entities::patient::PatientRecord;
use crate::entities::trial::TrialRecord;
use crate::error::TrialScoutError;
use crate::sources::extraction::ExtractionClient;
use crate::sources::registry::RegistryClient;

pub(crate) mod gateway;
pub(crate) mod score;

/// Full pipeline: transcript → extraction → normalizer → gateway → ranker.
///
/// Only the extraction collaborator can fail; every downstream stage is
/// error-free by construction.
pub(crate) async fn match_transcript(
    extraction: &ExtractionClient,
    registry: &RegistryClient,
    transcript: &str,
) -> Result<(PatientRecord, Vec<TrialRecord>), TrialScoutError> {
    let bag = extraction.extract(transcript).await?;
    let patient = PatientRecord::from_attributes(&bag);
    let trials = rematch(registry, &patient).await;
    Ok((patient, trials))
}

/// Re-match entry point: an already-normalized (possibly clinician-corrected)
/// record goes straight to the gateway and ranker. Infallible.
pub(crate) async fn rematch(
    registry: &RegistryClient,
    patient: &PatientRecord,
) -> Vec<TrialRecord> {
    let candidates = gateway::fetch_candidates(registry, patient).await;
    score::rank_trials(patient, candidates)
}
