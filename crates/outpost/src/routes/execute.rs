//! Command execution endpoint.

use axum::{Json, extract::State};
use outpost_common::{ExecutionRequest, ExecutionResult};

use super::ApiError;
use crate::state::AppState;

/// Run a whitelisted command
///
/// Returns:
/// - 200: process ran (any exit code)
/// - 400: empty or non-whitelisted command
/// - 404: executable not installed
/// - 408: timed out (process killed)
/// - 500: other execution fault
pub async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<ExecutionRequest>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let result = state.executor.execute(payload).await?;
    Ok(Json(result))
}
