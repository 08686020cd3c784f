use thiserror::Error;
use trialmatch_diagnostics::{TM0302, TrialMatchError};

/// Errors raised while loading a patient record
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read patient record {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid patient record JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The record parsed but violates a basic plausibility check
    #[error("invalid patient record '{patient_id}': {message}")]
    Invalid { patient_id: String, message: String },
}

impl From<ModelError> for TrialMatchError {
    fn from(err: ModelError) -> Self {
        TrialMatchError::data(TM0302, err.to_string())
    }
}
