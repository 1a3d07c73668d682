//! Metadata endpoint handler

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::response::FhirJson;

/// GET /metadata - Return server capability statement
pub async fn get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let server_base = state.address.determine_server_base(&headers);
    let statement = state.provider.capability_statement(&server_base);
    FhirJson(statement.as_ref()).into_response()
}
