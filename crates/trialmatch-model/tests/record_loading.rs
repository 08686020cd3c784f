use pretty_assertions::assert_eq;
use std::io::Write;
use trialmatch_model::{DriverLikelihood, LabMeasurement, ModelError, PatientRecord};
use trialmatch_types::{TreatmentCategory, TumorStage};

const FULL_RECORD: &str = r#"{
  "patientId": "ACTN-01-02-9999",
  "birthYear": 1958,
  "gender": "MALE",
  "clinicalStatus": { "who": 1, "hasActiveInfection": false },
  "tumor": {
    "doids": ["3910"],
    "stage": "IIIB",
    "hasMeasurableDisease": true,
    "hasBrainLesions": false,
    "hasLiverLesions": true
  },
  "priorConditions": [
    { "name": "Hypertension", "doids": ["10763"], "year": 2015 }
  ],
  "oncologicalHistory": [
    { "name": "Carboplatin+Pemetrexed", "categories": ["CHEMOTHERAPY"], "startYear": 2021,
      "stopYear": 2022, "numberOfCycles": 4 },
    { "name": "Radiotherapy", "categories": ["RADIOTHERAPY"], "startYear": 2022 }
  ],
  "labValues": [
    { "date": "2024-05-02", "measurement": "HEMOGLOBIN", "value": 7.4, "unit": "mmol/L",
      "refUpper": 10.7, "refLower": 8.5 }
  ],
  "molecular": {
    "date": "2024-02-11",
    "variants": [
      { "gene": "KRAS", "proteinImpact": "G12C", "isReportable": true, "driverLikelihood": "HIGH" }
    ],
    "amplifications": [{ "gene": "MET", "copies": 9, "isReportable": true }],
    "tumorMutationalBurden": 12.5,
    "microsatelliteUnstable": false
  }
}"#;

#[test]
fn test_full_record_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL_RECORD.as_bytes()).unwrap();

    let record = PatientRecord::from_path(file.path()).unwrap();

    assert_eq!(record.tumor.stage, Some(TumorStage::IIIB));
    assert_eq!(record.tumor.has_bone_lesions, None);
    assert_eq!(record.systemic_treatments().count(), 1);
    assert!(record.oncological_history[0].categories.contains(&TreatmentCategory::Chemotherapy));
    assert_eq!(record.latest_lab_value(LabMeasurement::Hemoglobin).map(|l| l.unit.as_str()), Some("mmol/L"));

    let molecular = record.molecular.as_ref().unwrap();
    assert_eq!(molecular.variants[0].driver_likelihood, Some(DriverLikelihood::High));
    assert_eq!(molecular.variants_in("KRAS").count(), 1);
    assert!(molecular.fusions.is_empty());
    assert_eq!(molecular.homologous_repair_deficient, None);
}

#[test]
fn test_unknown_stage_is_rejected() {
    let json = r#"{ "patientId": "X", "birthYear": 1960, "gender": "MALE", "tumor": { "stage": "V" } }"#;
    assert!(matches!(PatientRecord::from_json(json), Err(ModelError::Json(_))));
}

#[test]
fn test_missing_file() {
    let err = PatientRecord::from_path("/no/such/patient.json").unwrap_err();
    assert!(err.to_string().starts_with("cannot read patient record"));
}
