use std::borrow::Cow;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::TrialScoutError;
use crate::utils::serde::OneOrMany;

const REGISTRY_BASE: &str = "https://classic.clinicaltrials.gov/api/query";
const REGISTRY_API: &str = "ctgov-classic";
const REGISTRY_BASE_ENV: &str = "TRIALSCOUT_REGISTRY_BASE";

/// Fixed projection requested from the flat `study_fields` endpoint.
const STUDY_FIELDS: &[&str] = &[
    "NCTId",
    "BriefTitle",
    "OverallStatus",
    "Phase",
    "Condition",
    "LocationCity",
    "LocationState",
    "LocationCountry",
    "BriefSummary",
];

/// Client for the classic ClinicalTrials.gov v1 query API.
///
/// Exposes the two response shapes the gateway consumes: the nested
/// per-study `full_studies` endpoint and the flat per-field `study_fields`
/// endpoint.
#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base: Cow<'static, str>,
}

impl RegistryClient {
    pub fn new() -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(REGISTRY_BASE, REGISTRY_BASE_ENV),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, TrialScoutError> {
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, REGISTRY_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialScoutError::Api {
                api: REGISTRY_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| TrialScoutError::ApiJson {
            api: REGISTRY_API.to_string(),
            source,
        })
    }

    /// Rich nested endpoint: up to `max_rank` ranked studies for a free-text
    /// expression.
    pub async fn full_studies(
        &self,
        expr: &str,
        max_rank: usize,
    ) -> Result<FullStudiesEnvelope, TrialScoutError> {
        let url = self.endpoint("full_studies");
        let max_rank = max_rank.to_string();
        let req = self.client.get(&url).query(&[
            ("expr", expr),
            ("min_rnk", "1"),
            ("max_rnk", max_rank.as_str()),
            ("fmt", "json"),
        ]);
        self.get_json(req).await
    }

    /// Flat endpoint: up to `max_rank` rows carrying only the fixed field
    /// projection.
    pub async fn study_fields(
        &self,
        expr: &str,
        max_rank: usize,
    ) -> Result<StudyFieldsEnvelope, TrialScoutError> {
        let url = self.endpoint("study_fields");
        let fields = STUDY_FIELDS.join(",");
        let max_rank = max_rank.to_string();
        let req = self.client.get(&url).query(&[
            ("expr", expr),
            ("fields", fields.as_str()),
            ("min_rnk", "1"),
            ("max_rnk", max_rank.as_str()),
            ("fmt", "json"),
        ]);
        self.get_json(req).await
    }
}

// Nested `full_studies` shape. Every level defaults so a sparse or partial
// upstream document still deserializes.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FullStudiesEnvelope {
    #[serde(rename = "FullStudiesResponse", default)]
    pub response: FullStudiesResponse,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FullStudiesResponse {
    #[serde(rename = "FullStudies", default)]
    pub full_studies: Vec<RankedStudy>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RankedStudy {
    #[serde(rename = "Study", default)]
    pub study: FullStudy,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FullStudy {
    #[serde(rename = "ProtocolSection", default)]
    pub protocol_section: ProtocolSection,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProtocolSection {
    #[serde(rename = "IdentificationModule", default)]
    pub identification: IdentificationModule,
    #[serde(rename = "StatusModule", default)]
    pub status: StatusModule,
    #[serde(rename = "DesignModule", default)]
    pub design: DesignModule,
    #[serde(rename = "ConditionsModule", default)]
    pub conditions: ConditionsModule,
    #[serde(rename = "ContactsLocationsModule", default)]
    pub contacts_locations: ContactsLocationsModule,
    #[serde(rename = "DescriptionModule", default)]
    pub description: DescriptionModule,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IdentificationModule {
    #[serde(rename = "NCTId")]
    pub nct_id: Option<String>,
    #[serde(rename = "BriefTitle")]
    pub brief_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusModule {
    #[serde(rename = "OverallStatus")]
    pub overall_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DesignModule {
    #[serde(rename = "Phases", default)]
    pub phases: OneOrMany,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConditionsModule {
    #[serde(rename = "Conditions", default)]
    pub conditions: OneOrMany,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContactsLocationsModule {
    #[serde(rename = "Locations", default)]
    pub locations: Vec<StudyLocation>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StudyLocation {
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DescriptionModule {
    #[serde(rename = "BriefSummary")]
    pub brief_summary: Option<String>,
}

// Flat `study_fields` shape: one row per study, every projected field an
// array of strings.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StudyFieldsEnvelope {
    #[serde(rename = "StudyFieldsResponse", default)]
    pub response: StudyFieldsResponse,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StudyFieldsResponse {
    #[serde(rename = "StudyFields", default)]
    pub study_fields: Vec<StudyFieldsRow>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StudyFieldsRow {
    #[serde(rename = "NCTId", default)]
    pub nct_id: Vec<String>,
    #[serde(rename = "BriefTitle", default)]
    pub brief_title: Vec<String>,
    #[serde(rename = "OverallStatus", default)]
    pub overall_status: Vec<String>,
    #[serde(rename = "Phase", default)]
    pub phase: Vec<String>,
    #[serde(rename = "Condition", default)]
    pub condition: Vec<String>,
    #[serde(rename = "LocationCity", default)]
    pub location_city: Vec<String>,
    #[serde(rename = "LocationState", default)]
    pub location_state: Vec<String>,
    #[serde(rename = "LocationCountry", default)]
    pub location_country: Vec<String>,
    #[serde(rename = "BriefSummary", default)]
    pub brief_summary: Vec<String>,
}
