//! Health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    mode: &'static str,
    name: String,
    node_id: Option<String>,
    registered: bool,
    register_url: Option<String>,
    allowed_commands: Vec<String>,
    command_timeout: f64,
}

/// Liveness plus a summary of node identity and execution policy
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let runtime = state.store.read().await;

    Json(HealthResponse {
        status: "ok",
        mode: state.config.node_mode.as_str(),
        name: state.config.node_name.clone(),
        node_id: state.node_id(),
        registered: state.identity.is_registered(),
        register_url: state.config.reported_register_url().map(str::to_string),
        allowed_commands: runtime.allowed_commands().iter().cloned().collect(),
        command_timeout: runtime.command_timeout(),
    })
}
