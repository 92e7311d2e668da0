use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical structured representation of a patient's oncology-relevant
/// attributes. Produced once by the normalizer (or deserialized from a
/// clinician-corrected payload) and immutable afterwards.
///
/// Every scalar is independently optional; `prior_treatments` is always a
/// list, never absent. Serde defaults keep that invariant when a sparse
/// re-match body is deserialized directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancer_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub prior_treatments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_status: Option<String>,
}

impl PatientRecord {
    /// Coerces a loosely-typed attribute bag into a canonical record.
    ///
    /// Permissive-in, strict-out: recognized fields are copied through when
    /// they carry a plausible type, everything else takes its default, and
    /// unrecognized keys are dropped. Cannot fail — a partially-malformed
    /// upstream payload still yields a usable (if sparse) record.
    pub fn from_attributes(bag: &Value) -> Self {
        Self {
            age: bag
                .get("age")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
            sex: text_field(bag, "sex"),
            diagnosis: text_field(bag, "diagnosis"),
            cancer_stage: text_field(bag, "cancer_stage"),
            location: text_field(bag, "location"),
            prior_treatments: bag
                .get("prior_treatments")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            performance_status: text_field(bag, "performance_status"),
        }
    }

    /// Static demonstration record, served when extraction is mocked or
    /// unavailable so a live demo stays responsive.
    pub fn demo() -> Self {
        Self {
            age: Some(62),
            sex: Some("female".into()),
            diagnosis: Some("non-small cell lung cancer (adenocarcinoma)".into()),
            cancer_stage: Some("stage IIIA".into()),
            location: Some("Portland, Oregon".into()),
            prior_treatments: vec![
                "carboplatin".into(),
                "paclitaxel".into(),
                "concurrent chemoradiation".into(),
                "radiation therapy".into(),
            ],
            performance_status: Some("ECOG 1".into()),
        }
    }
}

fn text_field(bag: &Value, key: &str) -> Option<String> {
    bag.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
