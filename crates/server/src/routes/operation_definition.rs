//! OperationDefinition read handler

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::AppState;
use crate::error::AppError;
use crate::response::FhirJson;

/// GET /OperationDefinition/{id} - Describe a registered operation
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let definition = state.provider.read_operation_definition(&id)?;
    Ok(FhirJson(definition))
}
