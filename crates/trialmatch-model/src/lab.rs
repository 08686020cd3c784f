//! Laboratory measurements

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurements referenced by laboratory predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabMeasurement {
    Hemoglobin,
    ThrombocytesAbs,
    NeutrophilsAbs,
    Albumin,
    Asat,
    Alat,
    TotalBilirubin,
    Creatinine,
    Potassium,
    #[serde(other)]
    Other,
}

impl LabMeasurement {
    pub fn display(self) -> &'static str {
        match self {
            Self::Hemoglobin => "hemoglobin",
            Self::ThrombocytesAbs => "thrombocytes",
            Self::NeutrophilsAbs => "neutrophils",
            Self::Albumin => "albumin",
            Self::Asat => "ASAT",
            Self::Alat => "ALAT",
            Self::TotalBilirubin => "total bilirubin",
            Self::Creatinine => "creatinine",
            Self::Potassium => "potassium",
            Self::Other => "other measurement",
        }
    }
}

impl fmt::Display for LabMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabValue {
    pub date: NaiveDate,
    pub measurement: LabMeasurement,
    pub value: f64,
    pub unit: String,
    pub ref_upper: Option<f64>,
    pub ref_lower: Option<f64>,
}

impl LabValue {
    /// Value as a multiple of the upper limit of normal
    pub fn uln_multiple(&self) -> Option<f64> {
        self.ref_upper.filter(|upper| *upper > 0.0).map(|upper| self.value / upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_measurement_maps_to_other() {
        let value: LabValue = serde_json::from_str(
            r#"{ "date": "2024-03-01", "measurement": "LDH", "value": 250.0, "unit": "U/L",
                 "refUpper": 245.0, "refLower": null }"#,
        )
        .unwrap();
        assert_eq!(value.measurement, LabMeasurement::Other);
    }

    #[test]
    fn test_uln_multiple() {
        let mut value = LabValue {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            measurement: LabMeasurement::Asat,
            value: 90.0,
            unit: "U/L".into(),
            ref_upper: Some(30.0),
            ref_lower: None,
        };
        assert_eq!(value.uln_multiple(), Some(3.0));
        value.ref_upper = None;
        assert_eq!(value.uln_multiple(), None);
    }
}
