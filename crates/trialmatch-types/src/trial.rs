//! Trial, cohort and eligibility definitions

use crate::expression::RuleExpression;
use serde::{Deserialize, Serialize};

/// Reference to the protocol text a criterion was curated from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriterionReference {
    /// Protocol identifier such as `I-01` or `E-03`
    pub id: String,
    pub text: String,
}

impl CriterionReference {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A curated eligibility criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub references: Vec<CriterionReference>,
    pub function: RuleExpression,
}

impl Eligibility {
    /// Comma-separated reference ids, used to label results and errors
    pub fn label(&self) -> String {
        let ids: Vec<&str> = self.references.iter().map(|r| r.id.as_str()).collect();
        ids.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialIdentification {
    pub trial_id: String,
    pub acronym: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMetadata {
    pub cohort_id: String,
    pub description: String,
    /// Whether the cohort currently accepts patients
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub metadata: CohortMetadata,
    #[serde(default)]
    pub eligibility: Vec<Eligibility>,
}

/// A trial with its trial-wide criteria and per-cohort criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    pub identification: TrialIdentification,
    #[serde(default)]
    pub general_eligibility: Vec<Eligibility>,
    #[serde(default)]
    pub cohorts: Vec<Cohort>,
}

impl Trial {
    /// Every criterion of the trial, trial-wide ones first
    pub fn all_eligibility(&self) -> impl Iterator<Item = &Eligibility> {
        self.general_eligibility
            .iter()
            .chain(self.cohorts.iter().flat_map(|c| c.eligibility.iter()))
    }
}
