//! Health check endpoint

use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    resources: usize,
    operations: usize,
}

/// GET /health - Report the size of the loaded binding registry
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        resources: state.provider.resource_count(),
        operations: state.provider.operation_names().len(),
    })
}
