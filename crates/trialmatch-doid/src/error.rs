//! Ontology loading errors

use thiserror::Error;
use trialmatch_diagnostics::{TM0300, TM0301, TrialMatchError};

/// Errors raised while building or loading a [`DoidModel`](crate::DoidModel)
#[derive(Debug, Error)]
pub enum DoidError {
    /// The is-a hierarchy contains a cycle
    #[error("is-a cycle in disease ontology: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// The ontology or manual config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid obograph / config JSON
    #[error("invalid ontology JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but contains no DOID graph
    #[error("no disease ontology graph found in {0}")]
    EmptyGraph(String),
}

impl From<DoidError> for TrialMatchError {
    fn from(err: DoidError) -> Self {
        let code = match &err {
            DoidError::Cycle { .. } => TM0301,
            _ => TM0300,
        };
        TrialMatchError::data(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_and_code() {
        let err = DoidError::Cycle {
            path: vec!["1".into(), "2".into(), "1".into()],
        };
        assert_eq!(err.to_string(), "is-a cycle in disease ontology: 1 -> 2 -> 1");
        let converted: TrialMatchError = err.into();
        assert_eq!(converted.code(), TM0301);
    }
}
