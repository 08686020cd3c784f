//! Typed parameter values decoded from rule tokens
//!
//! These are the enumerated primitives a rule parameter can hold besides
//! plain integers, doubles and strings. Each parses from its upper-case
//! catalogue spelling (`IIIB`, `CHEMOTHERAPY`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token did not name a value of the expected enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{token}' is not a valid {kind}")]
pub struct ValueParseError {
    pub kind: &'static str,
    pub token: String,
}

impl ValueParseError {
    fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_string(),
        }
    }
}

// ============================================================================
// Tumor stage
// ============================================================================

/// Tumor stage, including sub-stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TumorStage {
    I,
    II,
    IIA,
    IIB,
    IIC,
    III,
    IIIA,
    IIIB,
    IIIC,
    IV,
}

impl TumorStage {
    pub const ALL: [TumorStage; 10] = [
        Self::I,
        Self::II,
        Self::IIA,
        Self::IIB,
        Self::IIC,
        Self::III,
        Self::IIIA,
        Self::IIIB,
        Self::IIIC,
        Self::IV,
    ];

    /// Main stage a sub-stage belongs to (`IIB` -> `II`)
    pub fn category(self) -> TumorStage {
        match self {
            Self::IIA | Self::IIB | Self::IIC => Self::II,
            Self::IIIA | Self::IIIB | Self::IIIC => Self::III,
            other => other,
        }
    }

    /// True when `self` is `other` or one of its sub-stages
    pub fn is_within(self, other: TumorStage) -> bool {
        self == other || self.category() == other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::IIA => "IIA",
            Self::IIB => "IIB",
            Self::IIC => "IIC",
            Self::III => "III",
            Self::IIIA => "IIIA",
            Self::IIIB => "IIIB",
            Self::IIIC => "IIIC",
            Self::IV => "IV",
        }
    }
}

impl FromStr for TumorStage {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ValueParseError::new("tumor stage", s))
    }
}

impl fmt::Display for TumorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Treatment category
// ============================================================================

/// Category of an anti-cancer treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreatmentCategory {
    Chemotherapy,
    TargetedTherapy,
    Immunotherapy,
    HormoneTherapy,
    Radiotherapy,
    Surgery,
    Transplantation,
    SupportiveTreatment,
}

impl TreatmentCategory {
    pub const ALL: [TreatmentCategory; 8] = [
        Self::Chemotherapy,
        Self::TargetedTherapy,
        Self::Immunotherapy,
        Self::HormoneTherapy,
        Self::Radiotherapy,
        Self::Surgery,
        Self::Transplantation,
        Self::SupportiveTreatment,
    ];

    /// Whether treatments of this category count as a systemic line
    pub fn is_systemic(self) -> bool {
        matches!(
            self,
            Self::Chemotherapy | Self::TargetedTherapy | Self::Immunotherapy | Self::HormoneTherapy
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chemotherapy => "CHEMOTHERAPY",
            Self::TargetedTherapy => "TARGETED_THERAPY",
            Self::Immunotherapy => "IMMUNOTHERAPY",
            Self::HormoneTherapy => "HORMONE_THERAPY",
            Self::Radiotherapy => "RADIOTHERAPY",
            Self::Surgery => "SURGERY",
            Self::Transplantation => "TRANSPLANTATION",
            Self::SupportiveTreatment => "SUPPORTIVE_TREATMENT",
        }
    }

    /// Lower-case display form used in evaluation messages
    pub fn display(self) -> String {
        self.as_str().replace('_', " ").to_lowercase()
    }
}

impl FromStr for TreatmentCategory {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ValueParseError::new("treatment category", s))
    }
}

impl fmt::Display for TreatmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Gender
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

// ============================================================================
// DOID term
// ============================================================================

/// A disease term from a rule parameter together with the DOID it resolved to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoidTerm {
    pub term: String,
    pub doid: String,
}

impl DoidTerm {
    pub fn new(term: impl Into<String>, doid: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            doid: doid.into(),
        }
    }
}

impl fmt::Display for DoidTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (DOID:{})", self.term, self.doid)
    }
}
