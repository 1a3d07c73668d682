//! Application error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fhir_core::{FhirError, OperationOutcome};

use crate::response::FhirJson;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, outcome) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, OperationOutcome::not_found(&msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, OperationOutcome::invalid(&msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                OperationOutcome::error(fhir_core::IssueType::Exception, &msg),
            ),
        };

        (status, FhirJson(outcome)).into_response()
    }
}

impl From<FhirError> for AppError {
    fn from(err: FhirError) -> Self {
        match err {
            FhirError::NotFound(msg) => AppError::NotFound(format!("Resource not found: {}", msg)),
            FhirError::Invalid(_) | FhirError::Parse(_) => AppError::BadRequest(err.to_string()),
            FhirError::Io { .. } => AppError::Internal(err.to_string()),
        }
    }
}
