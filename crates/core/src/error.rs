use crate::outcome::{IssueType, OperationOutcome};
use thiserror::Error;

/// FHIR server error types
#[derive(Debug, Error)]
pub enum FhirError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed binding registry: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FhirError {
    /// Convert into an OperationOutcome describing this error
    pub fn to_outcome(&self) -> OperationOutcome {
        let code = match self {
            FhirError::NotFound(_) => IssueType::NotFound,
            FhirError::Invalid(_) | FhirError::Parse(_) => IssueType::Invalid,
            FhirError::Io { .. } => IssueType::Exception,
        };
        OperationOutcome::error(code, &self.to_string())
    }
}
