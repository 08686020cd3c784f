//! Curated additions to the ontology
//!
//! The public DOID release does not encode everything trial curation relies
//! on. The manual config adds:
//! - the main cancer types used to label tumors in summaries
//! - adeno-squamous mappings, pairing a squamous and an adeno type with the
//!   mixed adeno-squamous type
//! - additional doids that are merged into an id's ancestor closure

use crate::error::DoidError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdenoSquamousMapping {
    pub squamous_doid: String,
    pub adeno_doid: String,
    pub adeno_squamous_doid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoidManualConfig {
    pub main_cancer_doids: HashSet<String>,
    pub adeno_squamous_mappings: Vec<AdenoSquamousMapping>,
    /// Extra ancestors per doid, merged into its closure
    pub additional_doids: HashMap<String, HashSet<String>>,
}

impl DoidManualConfig {
    pub fn from_json(json: &str) -> Result<Self, DoidError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DoidError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DoidError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
