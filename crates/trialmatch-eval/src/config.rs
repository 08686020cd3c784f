//! Evaluation settings

use chrono::{Datelike, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use trialmatch_diagnostics::{Result, TM0402, TrialMatchError};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn default_max_lab_age_days() -> i64 {
    90
}

/// Settings shared by all predicates of an engine
///
/// The reference date anchors every "within X years" and lab recency check,
/// so evaluating with a fixed date is reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluationConfig {
    pub reference_date: NaiveDate,
    /// Lab values older than this are treated as missing
    pub max_lab_age_days: i64,
    /// Molecular tests older than this only WARN; no limit when unset
    pub max_molecular_test_age_days: Option<i64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            reference_date: today(),
            max_lab_age_days: default_max_lab_age_days(),
            max_molecular_test_age_days: None,
        }
    }
}

impl EvaluationConfig {
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_date.year()
    }

    /// Oldest lab date still considered current
    pub fn min_lab_date(&self) -> Result<NaiveDate> {
        TimeDelta::try_days(self.max_lab_age_days)
            .and_then(|age| self.reference_date.checked_sub_signed(age))
            .ok_or_else(|| {
                invalid(format!(
                    "maxLabAgeDays {} reaches outside the calendar",
                    self.max_lab_age_days
                ))
            })
    }

    /// Reject age limits that are negative or out of date range
    pub fn validate(&self) -> Result<()> {
        if self.max_lab_age_days < 0 {
            return Err(invalid(format!(
                "maxLabAgeDays must not be negative, got {}",
                self.max_lab_age_days
            )));
        }
        self.min_lab_date()?;
        match self.max_molecular_test_age_days {
            Some(days) if days < 0 => Err(invalid(format!(
                "maxMolecularTestAgeDays must not be negative, got {}",
                days
            ))),
            _ => Ok(()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| invalid(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| TrialMatchError::from(err).with_context(path.display().to_string()))?;
        Self::from_json(&json).map_err(|err| err.with_context(path.display().to_string()))
    }
}

fn invalid(message: String) -> TrialMatchError {
    TrialMatchError::system(TM0402, format!("invalid evaluation config: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EvaluationConfig::from_json(r#"{"referenceDate": "2024-03-01"}"#).unwrap();
        assert_eq!(config.reference_year(), 2024);
        assert_eq!(config.max_lab_age_days, 90);
        assert_eq!(config.max_molecular_test_age_days, None);
        assert_eq!(
            config.min_lab_date().unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 2).unwrap()
        );
    }

    #[test]
    fn test_invalid_json() {
        let err = EvaluationConfig::from_json("{\"maxLabAgeDays\": \"soon\"}").unwrap_err();
        assert_eq!(err.code(), TM0402);
    }

    #[rstest]
    #[case::negative(r#"{"maxLabAgeDays": -1}"#)]
    #[case::beyond_time_delta(r#"{"maxLabAgeDays": 1000000000000000}"#)]
    #[case::beyond_calendar(r#"{"maxLabAgeDays": 100000000}"#)]
    #[case::negative_molecular(r#"{"maxMolecularTestAgeDays": -30}"#)]
    fn test_out_of_range_ages_are_rejected(#[case] json: &str) {
        let err = EvaluationConfig::from_json(json).unwrap_err();
        assert_eq!(err.code(), TM0402);
    }

    #[test]
    fn test_min_lab_date_out_of_range() {
        let config = EvaluationConfig {
            max_lab_age_days: i64::MAX,
            ..EvaluationConfig::default()
        };
        assert_eq!(config.min_lab_date().unwrap_err().code(), TM0402);
        assert!(config.validate().is_err());
    }
}
