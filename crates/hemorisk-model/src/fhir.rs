//! Record extraction from FHIR R4 JSON
//!
//! Supported resource types:
//! - `Condition` -> [`ResourceKind::Condition`]
//! - `MedicationRequest` / `MedicationStatement` -> [`ResourceKind::Medication`]
//! - `Procedure` -> [`ResourceKind::Procedure`]
//!
//! Extraction is lenient about everything except the resource type: a
//! record with no codings, text, status or date still matches keyword and
//! status-free rules, so it is kept rather than dropped.

use crate::error::ExtractError;
use chrono::NaiveDate;
use hemorisk_types::{ClinicalRecord, ClinicalStatus, Coding, ResourceKind};
use log::{debug, warn};
use serde_json::Value;

/// Extract one clinical record from a FHIR resource.
pub fn record_from_json(resource: &Value) -> Result<ClinicalRecord, ExtractError> {
    let resource_type = resource
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or(ExtractError::MissingResourceType)?;

    let record = match resource_type {
        "Condition" => condition_record(resource),
        "MedicationRequest" => medication_record(resource, "authoredOn"),
        "MedicationStatement" => medication_record(resource, "effectiveDateTime"),
        "Procedure" => procedure_record(resource),
        other => {
            return Err(ExtractError::UnsupportedType {
                resource_type: other.to_string(),
            });
        }
    };
    Ok(record)
}

/// Extract every supported record from a FHIR Bundle.
///
/// A plain JSON array of resources is accepted as well. Unsupported entry
/// types are skipped silently; malformed entries are skipped with a
/// warning. Only a value that is not bundle-shaped at all is an error.
pub fn records_from_bundle(bundle: &Value) -> Result<Vec<ClinicalRecord>, ExtractError> {
    let resources: Vec<&Value> = if let Some(entries) = bundle.as_array() {
        entries.iter().collect()
    } else if bundle.get("resourceType").and_then(Value::as_str) == Some("Bundle") {
        bundle
            .get("entry")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("resource"))
                    .collect()
            })
            .unwrap_or_default()
    } else {
        return Err(ExtractError::MalformedBundle {
            message: "expected a Bundle resource or an array of resources".to_string(),
        });
    };

    let mut records = Vec::new();
    for resource in resources {
        match record_from_json(resource) {
            Ok(record) => records.push(record),
            Err(ExtractError::UnsupportedType { resource_type }) => {
                debug!("Skipping unsupported bundle entry: {resource_type}");
            }
            Err(e) => warn!("Skipping malformed bundle entry: {e}"),
        }
    }
    Ok(records)
}

fn condition_record(resource: &Value) -> ClinicalRecord {
    let mut record = base_record(ResourceKind::Condition, resource);
    fill_concept(&mut record, resource.get("code"));
    record.status = status_of(resource.get("clinicalStatus"));
    record.recorded = date_field(resource, "recordedDate")
        .or_else(|| date_field(resource, "onsetDateTime"));
    record
}

fn medication_record(resource: &Value, date_key: &str) -> ClinicalRecord {
    let mut record = base_record(ResourceKind::Medication, resource);
    fill_concept(&mut record, resource.get("medicationCodeableConcept"));
    record.status = status_of(resource.get("status"));
    record.recorded =
        date_field(resource, date_key).or_else(|| date_field(resource, "dateAsserted"));
    record
}

fn procedure_record(resource: &Value) -> ClinicalRecord {
    let mut record = base_record(ResourceKind::Procedure, resource);
    fill_concept(&mut record, resource.get("code"));
    record.status = status_of(resource.get("status"));
    record.recorded = date_field(resource, "performedDateTime").or_else(|| {
        resource
            .get("performedPeriod")
            .and_then(|p| p.get("start"))
            .and_then(Value::as_str)
            .and_then(parse_fhir_date)
    });
    record
}

fn base_record(kind: ResourceKind, resource: &Value) -> ClinicalRecord {
    // A resource without an id still matches; the id is trace-only.
    let id = resource.get("id").and_then(Value::as_str).unwrap_or("");
    ClinicalRecord::new(kind, id)
}

/// Copy codings and display text out of a CodeableConcept.
fn fill_concept(record: &mut ClinicalRecord, concept: Option<&Value>) {
    let Some(concept) = concept else { return };
    if let Some(codings) = concept.get("coding").and_then(Value::as_array) {
        for coding in codings {
            let system = coding.get("system").and_then(Value::as_str);
            let code = coding.get("code").and_then(Value::as_str);
            let (Some(system), Some(code)) = (system, code) else {
                continue;
            };
            let mut parsed = Coding::new(system, code);
            if let Some(display) = coding.get("display").and_then(Value::as_str) {
                parsed = parsed.with_display(display);
            }
            record.codings.push(parsed);
        }
    }
    if let Some(text) = concept.get("text").and_then(Value::as_str) {
        record.text = Some(text.to_string());
    }
}

/// Status from either a plain code string or a CodeableConcept.
fn status_of(value: Option<&Value>) -> Option<ClinicalStatus> {
    let value = value?;
    if let Some(code) = value.as_str() {
        return Some(ClinicalStatus::parse(code));
    }
    let code = value
        .get("coding")
        .and_then(Value::as_array)
        .and_then(|codings| codings.first())
        .and_then(|coding| coding.get("code"))
        .and_then(Value::as_str)
        .or_else(|| value.get("text").and_then(Value::as_str))?;
    Some(ClinicalStatus::parse(code))
}

fn date_field(resource: &Value, key: &str) -> Option<NaiveDate> {
    resource
        .get(key)
        .and_then(Value::as_str)
        .and_then(parse_fhir_date)
}

/// Date part of a FHIR `date` or `dateTime` value.
fn parse_fhir_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_condition_extraction() {
        let resource = json!({
            "resourceType": "Condition",
            "id": "cond-1",
            "clinicalStatus": {
                "coding": [{
                    "system": "http://terminology.hl7.org/CodeSystem/condition-clinical",
                    "code": "active"
                }]
            },
            "code": {
                "coding": [
                    {"system": "http://hl7.org/fhir/sid/icd-10", "code": "K92.2", "display": "GI hemorrhage"},
                    {"system": "http://snomed.info/sct", "code": "74474003"}
                ],
                "text": "Gastrointestinal bleeding"
            },
            "recordedDate": "2024-02-10T09:15:00Z"
        });

        let record = record_from_json(&resource).unwrap();
        assert_eq!(record.kind, ResourceKind::Condition);
        assert_eq!(record.id, "cond-1");
        assert_eq!(record.status, Some(ClinicalStatus::Active));
        assert_eq!(record.codings.len(), 2);
        assert_eq!(record.codings[0].code, "K92.2");
        assert_eq!(record.text.as_deref(), Some("Gastrointestinal bleeding"));
        assert_eq!(
            record.recorded,
            Some(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap())
        );
    }

    #[test]
    fn test_medication_request_extraction() {
        let resource = json!({
            "resourceType": "MedicationRequest",
            "id": "rx-1",
            "status": "active",
            "medicationCodeableConcept": {
                "coding": [{
                    "system": "http://www.nlm.nih.gov/research/umls/rxnorm",
                    "code": "11289",
                    "display": "Warfarin"
                }]
            },
            "authoredOn": "2024-05-01"
        });

        let record = record_from_json(&resource).unwrap();
        assert_eq!(record.kind, ResourceKind::Medication);
        assert_eq!(record.status, Some(ClinicalStatus::Active));
        assert_eq!(record.codings[0].code, "11289");
        assert_eq!(
            record.recorded,
            Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
    }

    #[test]
    fn test_procedure_period_start_fallback() {
        let resource = json!({
            "resourceType": "Procedure",
            "id": "proc-1",
            "status": "completed",
            "code": {"coding": [{"system": "http://snomed.info/sct", "code": "116859006"}]},
            "performedPeriod": {"start": "2023-11-20", "end": "2023-11-21"}
        });

        let record = record_from_json(&resource).unwrap();
        assert_eq!(record.kind, ResourceKind::Procedure);
        assert_eq!(
            record.recorded,
            Some(NaiveDate::from_ymd_opt(2023, 11, 20).unwrap())
        );
    }

    #[test]
    fn test_coding_without_code_is_skipped() {
        let resource = json!({
            "resourceType": "Condition",
            "id": "cond-2",
            "code": {
                "coding": [
                    {"system": "http://snomed.info/sct"},
                    {"system": "http://snomed.info/sct", "code": "131148009"}
                ]
            }
        });

        let record = record_from_json(&resource).unwrap();
        assert_eq!(record.codings.len(), 1);
        assert_eq!(record.codings[0].code, "131148009");
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let resource = json!({"resourceType": "Patient", "id": "p-1"});
        let err = record_from_json(&resource).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType { .. }));
    }

    #[test]
    fn test_bundle_skips_unsupported_and_malformed_entries() {
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "entry": [
                {"resource": {"resourceType": "Patient", "id": "p-1"}},
                {"resource": {"resourceType": "Condition", "id": "cond-1",
                              "code": {"text": "anemia"}}},
                {"resource": {"no_type_here": true}},
                {"resource": {"resourceType": "MedicationRequest", "id": "rx-1",
                              "status": "active",
                              "medicationCodeableConcept": {"text": "warfarin"}}}
            ]
        });

        let records = records_from_bundle(&bundle).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "cond-1");
        assert_eq!(records[1].id, "rx-1");
    }

    #[test]
    fn test_plain_array_accepted_as_bundle() {
        let bundle = json!([
            {"resourceType": "Condition", "id": "c1", "code": {"text": "bleed"}},
            {"resourceType": "Procedure", "id": "pr1",
             "code": {"coding": [{"system": "http://snomed.info/sct", "code": "116859006"}]}}
        ]);
        let records = records_from_bundle(&bundle).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_non_bundle_value_is_an_error() {
        let err = records_from_bundle(&json!({"resourceType": "Condition"})).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedBundle { .. }));
    }

    #[test]
    fn test_unparseable_date_ignored() {
        let resource = json!({
            "resourceType": "Condition",
            "id": "cond-3",
            "code": {"text": "bleed"},
            "recordedDate": "around easter"
        });
        let record = record_from_json(&resource).unwrap();
        assert_eq!(record.recorded, None);
    }
}
