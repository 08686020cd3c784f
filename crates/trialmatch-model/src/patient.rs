use crate::error::ModelError;
use crate::history::{PriorCondition, TreatmentHistoryEntry};
use crate::lab::{LabMeasurement, LabValue};
use crate::molecular::MolecularTest;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use trialmatch_types::{Gender, TumorStage};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicalStatus {
    /// WHO performance status, 0 to 5
    pub who: Option<i32>,
    pub has_active_infection: Option<bool>,
}

/// Primary tumor details; `None` means the feed did not say
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TumorDetails {
    pub doids: Option<BTreeSet<String>>,
    pub stage: Option<TumorStage>,
    pub has_measurable_disease: Option<bool>,
    pub has_brain_lesions: Option<bool>,
    pub has_active_brain_lesions: Option<bool>,
    pub has_cns_lesions: Option<bool>,
    pub has_active_cns_lesions: Option<bool>,
    pub has_liver_lesions: Option<bool>,
    pub has_bone_lesions: Option<bool>,
}

/// Everything known about one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub patient_id: String,
    pub birth_year: i32,
    pub gender: Gender,
    #[serde(default)]
    pub clinical_status: ClinicalStatus,
    #[serde(default)]
    pub tumor: TumorDetails,
    #[serde(default)]
    pub prior_conditions: Vec<PriorCondition>,
    #[serde(default)]
    pub oncological_history: Vec<TreatmentHistoryEntry>,
    #[serde(default)]
    pub lab_values: Vec<LabValue>,
    #[serde(default)]
    pub molecular: Option<MolecularTest>,
}

impl PatientRecord {
    /// Minimal record with no clinical data
    pub fn new(patient_id: impl Into<String>, birth_year: i32, gender: Gender) -> Self {
        Self {
            patient_id: patient_id.into(),
            birth_year,
            gender,
            clinical_status: ClinicalStatus::default(),
            tumor: TumorDetails::default(),
            prior_conditions: Vec::new(),
            oncological_history: Vec::new(),
            lab_values: Vec::new(),
            molecular: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let record: Self = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let record = Self::from_json(&json)?;
        debug!("Loaded patient {} from {}", record.patient_id, path.display());
        Ok(record)
    }

    /// Plausibility checks that make a record unusable when violated
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |message: String| ModelError::Invalid {
            patient_id: self.patient_id.clone(),
            message,
        };
        if self.patient_id.trim().is_empty() {
            return Err(invalid("patient id is empty".to_string()));
        }
        if !(1900..=2100).contains(&self.birth_year) {
            return Err(invalid(format!("birth year {} out of range", self.birth_year)));
        }
        match self.clinical_status.who {
            Some(who) if !(0..=5).contains(&who) => {
                return Err(invalid(format!("WHO status {} out of range 0-5", who)));
            }
            _ => {}
        }
        Ok(())
    }

    /// Most recent lab value of a measurement
    pub fn latest_lab_value(&self, measurement: LabMeasurement) -> Option<&LabValue> {
        self.lab_values
            .iter()
            .filter(|lab| lab.measurement == measurement)
            .max_by_key(|lab| lab.date)
    }

    pub fn systemic_treatments(&self) -> impl Iterator<Item = &TreatmentHistoryEntry> {
        self.oncological_history.iter().filter(|t| t.is_systemic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_json() {
        let record = PatientRecord::from_json(
            r#"{ "patientId": "P-001", "birthYear": 1960, "gender": "FEMALE" }"#,
        )
        .unwrap();
        assert_eq!(record.gender, Gender::Female);
        assert!(record.tumor.doids.is_none());
        assert!(record.molecular.is_none());
    }

    #[test]
    fn test_validation() {
        let mut record = PatientRecord::new("P-002", 1960, Gender::Male);
        assert!(record.validate().is_ok());
        record.clinical_status.who = Some(7);
        let err = record.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid patient record 'P-002': WHO status 7 out of range 0-5");
        record.clinical_status.who = Some(1);
        record.birth_year = 1800;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_latest_lab_value() {
        let lab = |day: u32, value: f64| LabValue {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            measurement: LabMeasurement::Hemoglobin,
            value,
            unit: "g/dL".into(),
            ref_upper: None,
            ref_lower: None,
        };
        let mut record = PatientRecord::new("P-003", 1970, Gender::Female);
        record.lab_values = vec![lab(3, 11.0), lab(20, 9.5), lab(10, 10.0)];
        assert_eq!(record.latest_lab_value(LabMeasurement::Hemoglobin).map(|l| l.value), Some(9.5));
        assert!(record.latest_lab_value(LabMeasurement::Albumin).is_none());
    }
}
