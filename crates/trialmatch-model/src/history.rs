//! Prior conditions and oncological treatment history

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use trialmatch_types::TreatmentCategory;

/// A condition from the patient's medical history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorCondition {
    pub name: String,
    #[serde(default)]
    pub doids: BTreeSet<String>,
    /// Year of diagnosis, when known
    pub year: Option<i32>,
}

/// One line of oncological treatment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentHistoryEntry {
    pub name: String,
    #[serde(default)]
    pub categories: BTreeSet<TreatmentCategory>,
    pub start_year: Option<i32>,
    pub stop_year: Option<i32>,
    pub number_of_cycles: Option<i32>,
    /// Explicit systemic flag; derived from the categories when absent
    pub is_systemic: Option<bool>,
}

impl TreatmentHistoryEntry {
    pub fn is_systemic(&self) -> bool {
        self.is_systemic
            .unwrap_or_else(|| self.categories.iter().any(|c| c.is_systemic()))
    }

    /// Case-insensitive name match
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Most recent year the treatment is known to have been given
    pub fn last_known_year(&self) -> Option<i32> {
        self.stop_year.or(self.start_year)
    }
}
