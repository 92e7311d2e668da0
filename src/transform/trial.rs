use crate::entities::patient::PatientRecord;
use crate::entities::trial::{
    self, PLACEHOLDER_DESCRIPTION, PLACEHOLDER_STATUS, PLACEHOLDER_TITLE, TrialRecord, UNKNOWN_ID,
};
use crate::sources::registry::{FullStudy, StudyFieldsRow};

fn clean_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn join_phases(phases: Vec<String>) -> Option<String> {
    let phases = clean_list(phases);
    if phases.is_empty() {
        None
    } else {
        Some(phases.join(", "))
    }
}

/// Maps one nested `full_studies` document into a canonical Trial Record.
pub(crate) fn from_full_study(study: &FullStudy) -> TrialRecord {
    let section = &study.protocol_section;

    let nct_id = clean_opt(section.identification.nct_id.as_deref())
        .unwrap_or_else(|| UNKNOWN_ID.to_string());
    let title = clean_opt(section.identification.brief_title.as_deref())
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
    let status = clean_opt(section.status.overall_status.as_deref())
        .unwrap_or_else(|| PLACEHOLDER_STATUS.to_string());
    let phase = join_phases(section.design.phases.to_vec());
    let conditions = clean_list(section.conditions.conditions.to_vec());
    let locations = section
        .contacts_locations
        .locations
        .iter()
        .filter_map(|loc| {
            let parts: Vec<&str> = [
                loc.city.as_deref(),
                loc.state.as_deref(),
                loc.country.as_deref(),
            ]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        })
        .collect();
    let brief_description = clean_opt(section.description.brief_summary.as_deref())
        .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string());

    TrialRecord {
        url: trial::study_url(&nct_id),
        nct_id,
        title,
        phase,
        status,
        conditions,
        locations,
        brief_description,
        score: None,
    }
}

/// Maps one flat `study_fields` row into a canonical Trial Record.
///
/// Location strings are rebuilt positionally: index `i` of the city, state
/// and country arrays describes the same site, and an index where all three
/// parts are blank is skipped.
pub(crate) fn from_study_fields_row(row: &StudyFieldsRow) -> TrialRecord {
    let nct_id = clean_opt(row.nct_id.first().map(String::as_str))
        .unwrap_or_else(|| UNKNOWN_ID.to_string());
    let title = clean_opt(row.brief_title.first().map(String::as_str))
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
    let status = clean_opt(row.overall_status.first().map(String::as_str))
        .unwrap_or_else(|| PLACEHOLDER_STATUS.to_string());
    let phase = clean_opt(row.phase.first().map(String::as_str));
    let conditions = clean_list(row.condition.clone());

    let site_count = row
        .location_city
        .len()
        .max(row.location_state.len())
        .max(row.location_country.len());
    let locations = (0..site_count)
        .filter_map(|i| {
            let parts: Vec<&str> = [
                row.location_city.get(i),
                row.location_state.get(i),
                row.location_country.get(i),
            ]
            .into_iter()
            .flatten()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        })
        .collect();

    let brief_description = clean_opt(row.brief_summary.first().map(String::as_str))
        .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string());

    TrialRecord {
        url: trial::study_url(&nct_id),
        nct_id,
        title,
        phase,
        status,
        conditions,
        locations,
        brief_description,
        score: None,
    }
}

/// Synthesizes the two placeholder trials for the final fallback tier, so the
/// pipeline always has something to rank and display.
pub(crate) fn synthetic_fallback(patient: &PatientRecord) -> Vec<TrialRecord> {
    let diagnosis = patient.diagnosis.as_deref().unwrap_or("cancer");
    let location = patient.location.as_deref().unwrap_or("United States");

    vec![
        TrialRecord {
            nct_id: "NCT-DEMO-001".into(),
            title: format!("A Study for {diagnosis}"),
            phase: Some("Phase 2".into()),
            status: "Recruiting".into(),
            conditions: vec![diagnosis.to_string()],
            locations: vec![location.to_string()],
            brief_description: format!(
                "Mock trial for {diagnosis} to keep demo responsive while ClinicalTrials.gov is unreachable."
            ),
            url: trial::REGISTRY_ROOT_URL.to_string(),
            score: None,
        },
        TrialRecord {
            nct_id: "NCT-DEMO-002".into(),
            title: format!("Investigational Therapy in {diagnosis}"),
            phase: Some("Phase 3".into()),
            status: "Recruiting".into(),
            conditions: vec![diagnosis.to_string()],
            locations: vec![location.to_string()],
            brief_description: format!("Mock late-phase option for {diagnosis}."),
            url: trial::REGISTRY_ROOT_URL.to_string(),
            score: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_study(value: serde_json::Value) -> FullStudy {
        serde_json::from_value(value).expect("valid study")
    }

    fn study_fields_row(value: serde_json::Value) -> StudyFieldsRow {
        serde_json::from_value(value).expect("valid row")
    }

    #[test]
    fn full_study_maps_all_modules() {
        let study = full_study(json!({
            "ProtocolSection": {
                "IdentificationModule": {"NCTId": "NCT01234567", "BriefTitle": "Osimertinib in NSCLC"},
                "StatusModule": {"OverallStatus": "Recruiting"},
                "DesignModule": {"Phases": ["Phase 2", "Phase 3"]},
                "ConditionsModule": {"Conditions": ["Non-small Cell Lung Cancer"]},
                "ContactsLocationsModule": {"Locations": [
                    {"City": "Portland", "State": "Oregon", "Country": "United States"},
                    {"City": "Boston", "Country": "United States"}
                ]},
                "DescriptionModule": {"BriefSummary": "A late-phase study."}
            }
        }));

        let record = from_full_study(&study);
        assert_eq!(record.nct_id, "NCT01234567");
        assert_eq!(record.title, "Osimertinib in NSCLC");
        assert_eq!(record.status, "Recruiting");
        assert_eq!(record.phase.as_deref(), Some("Phase 2, Phase 3"));
        assert_eq!(record.conditions, vec!["Non-small Cell Lung Cancer"]);
        assert_eq!(
            record.locations,
            vec!["Portland, Oregon, United States", "Boston, United States"]
        );
        assert_eq!(record.brief_description, "A late-phase study.");
        assert_eq!(record.url, "https://clinicaltrials.gov/study/NCT01234567");
        assert_eq!(record.score, None);
    }

    #[test]
    fn full_study_accepts_scalar_phase_and_condition() {
        let study = full_study(json!({
            "ProtocolSection": {
                "IdentificationModule": {"NCTId": "NCT07654321"},
                "DesignModule": {"Phases": "Phase 1"},
                "ConditionsModule": {"Conditions": "Melanoma"}
            }
        }));

        let record = from_full_study(&study);
        assert_eq!(record.phase.as_deref(), Some("Phase 1"));
        assert_eq!(record.conditions, vec!["Melanoma"]);
    }

    #[test]
    fn full_study_defaults_every_missing_field() {
        let record = from_full_study(&full_study(json!({})));

        assert_eq!(record.nct_id, "N/A");
        assert_eq!(record.title, "Untitled");
        assert_eq!(record.status, "Unknown");
        assert_eq!(record.phase, None);
        assert!(record.conditions.is_empty());
        assert!(record.locations.is_empty());
        assert_eq!(record.brief_description, "No description available.");
        assert_eq!(record.url, "https://clinicaltrials.gov/");
    }

    #[test]
    fn study_fields_row_takes_first_scalar_entries() {
        let row = study_fields_row(json!({
            "NCTId": ["NCT00000042"],
            "BriefTitle": ["Flat Study"],
            "OverallStatus": ["Active, not recruiting"],
            "Phase": ["Phase 3"],
            "Condition": ["Breast Cancer", "HER2-positive Breast Cancer"],
            "BriefSummary": ["A flat-projection study."]
        }));

        let record = from_study_fields_row(&row);
        assert_eq!(record.nct_id, "NCT00000042");
        assert_eq!(record.title, "Flat Study");
        assert_eq!(record.status, "Active, not recruiting");
        assert_eq!(record.phase.as_deref(), Some("Phase 3"));
        assert_eq!(
            record.conditions,
            vec!["Breast Cancer", "HER2-positive Breast Cancer"]
        );
        assert_eq!(record.url, "https://clinicaltrials.gov/study/NCT00000042");
    }

    #[test]
    fn study_fields_locations_are_rebuilt_positionally() {
        let row = study_fields_row(json!({
            "NCTId": ["NCT00000043"],
            "LocationCity": ["Portland", "", "Seattle"],
            "LocationState": ["Oregon", "", ""],
            "LocationCountry": ["United States", "", "United States", "Canada"]
        }));

        let record = from_study_fields_row(&row);
        // Index 1 is blank in all three arrays and is skipped; index 3 only
        // has a country.
        assert_eq!(
            record.locations,
            vec![
                "Portland, Oregon, United States",
                "Seattle, United States",
                "Canada"
            ]
        );
    }

    #[test]
    fn study_fields_row_defaults_when_arrays_are_empty() {
        let record = from_study_fields_row(&study_fields_row(json!({})));

        assert_eq!(record.nct_id, "N/A");
        assert_eq!(record.title, "Untitled");
        assert_eq!(record.status, "Unknown");
        assert_eq!(record.phase, None);
        assert!(record.locations.is_empty());
        assert_eq!(record.url, "https://clinicaltrials.gov/");
    }

    #[test]
    fn synthetic_fallback_uses_patient_diagnosis_and_location() {
        let patient = PatientRecord {
            diagnosis: Some("melanoma".into()),
            location: Some("Denver, Colorado".into()),
            ..PatientRecord::default()
        };

        let records = synthetic_fallback(&patient);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].nct_id, "NCT-DEMO-001");
        assert_eq!(records[0].phase.as_deref(), Some("Phase 2"));
        assert_eq!(records[1].nct_id, "NCT-DEMO-002");
        assert_eq!(records[1].phase.as_deref(), Some("Phase 3"));
        for record in &records {
            assert_eq!(record.status, "Recruiting");
            assert_eq!(record.conditions, vec!["melanoma"]);
            assert_eq!(record.locations, vec!["Denver, Colorado"]);
        }
    }

    #[test]
    fn synthetic_fallback_defaults_for_an_empty_record() {
        let records = synthetic_fallback(&PatientRecord::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "A Study for cancer");
        for record in &records {
            assert_eq!(record.conditions, vec!["cancer"]);
            assert_eq!(record.locations, vec!["United States"]);
        }
    }
}
