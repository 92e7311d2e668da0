use tracing::warn;

use crate::entities::patient::PatientRecord;
use crate::entities::trial::TrialRecord;
use crate::error::TrialScoutError;
use crate::sources::registry::RegistryClient;
use crate::transform::trial::{from_full_study, from_study_fields_row, synthetic_fallback};
use crate::utils::location::split_location;

const RICH_TIER_MAX_RANK: usize = 30;
const LEAN_TIER_MAX_RANK: usize = 50;
const DEFAULT_EXPRESSION: &str = "cancer";

/// Builds the free-text registry expression from the patient record:
/// diagnosis, city, region, then an "age N" token, with `"cancer"` as the
/// fallback when every part is absent.
pub(crate) fn build_expression(patient: &PatientRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(diagnosis) = patient.diagnosis.as_deref() {
        parts.push(diagnosis.to_string());
    }
    if let Some(location) = patient.location.as_deref() {
        let tokens = split_location(location);
        if let Some(city) = tokens.city {
            parts.push(city.to_string());
        }
        if let Some(region) = tokens.region {
            parts.push(region.to_string());
        }
    }
    if let Some(age) = patient.age {
        parts.push(format!("age {age}"));
    }

    let expr = parts.join(" ").trim().to_string();
    if expr.is_empty() {
        DEFAULT_EXPRESSION.to_string()
    } else {
        expr
    }
}

/// Fetches candidate trials through the three-tier fallback chain.
///
/// Tiers run sequentially; a tier that errors or comes back empty hands over
/// to the next one, and the synthetic tier closes the chain unconditionally.
/// The returned list is therefore never empty, and no failure escapes.
pub(crate) async fn fetch_candidates(
    registry: &RegistryClient,
    patient: &PatientRecord,
) -> Vec<TrialRecord> {
    let expr = build_expression(patient);

    match rich_tier(registry, &expr).await {
        Ok(trials) if !trials.is_empty() => return trials,
        Ok(_) => warn!(tier = "full_studies", %expr, "tier returned no records"),
        Err(err) => warn!(tier = "full_studies", %expr, error = %err, "tier failed"),
    }

    match lean_tier(registry, &expr).await {
        Ok(trials) if !trials.is_empty() => return trials,
        Ok(_) => warn!(tier = "study_fields", %expr, "tier returned no records"),
        Err(err) => warn!(tier = "study_fields", %expr, error = %err, "tier failed"),
    }

    synthetic_fallback(patient)
}

async fn rich_tier(
    registry: &RegistryClient,
    expr: &str,
) -> Result<Vec<TrialRecord>, TrialScoutError> {
    let envelope = registry.full_studies(expr, RICH_TIER_MAX_RANK).await?;
    Ok(envelope
        .response
        .full_studies
        .iter()
        .map(|ranked| from_full_study(&ranked.study))
        .collect())
}

async fn lean_tier(
    registry: &RegistryClient,
    expr: &str,
) -> Result<Vec<TrialRecord>, TrialScoutError> {
    let envelope = registry.study_fields(expr, LEAN_TIER_MAX_RANK).await?;
    Ok(envelope
        .response
        .study_fields
        .iter()
        .map(from_study_fields_row)
        .collect())
}
