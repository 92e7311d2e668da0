use serde::{Deserialize, Serialize};

/// Sentinel id used when the registry omits the trial identifier.
pub(crate) const UNKNOWN_ID: &str = "N/A";
/// Landing page used when no per-study URL can be constructed.
pub(crate) const REGISTRY_ROOT_URL: &str = "https://clinicaltrials.gov/";

pub(crate) const PLACEHOLDER_TITLE: &str = "Untitled";
pub(crate) const PLACEHOLDER_STATUS: &str = "Unknown";
pub(crate) const PLACEHOLDER_DESCRIPTION: &str = "No description available.";

/// Canonical representation of one registry trial, normalized from either
/// external response shape. Produced fresh per request; `score` is assigned
/// only by the ranker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub nct_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    pub status: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    pub brief_description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

/// Study URL for a known id, registry root otherwise.
pub(crate) fn study_url(nct_id: &str) -> String {
    if nct_id == UNKNOWN_ID {
        REGISTRY_ROOT_URL.to_string()
    } else {
        format!("https://clinicaltrials.gov/study/{nct_id}")
    }
}
