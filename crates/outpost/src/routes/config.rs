//! Runtime configuration endpoints.

use axum::{Json, extract::State};
use outpost_common::{ConfigPatch, OutpostError, RuntimeConfig};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ConfigResponse {
    mode: &'static str,
    node_id: Option<String>,
    registered: bool,
    register_url: Option<String>,
    allowed_commands: Vec<String>,
    command_timeout: f64,
    heartbeat_interval: f64,
}

impl ConfigResponse {
    fn new(state: &AppState, runtime: &RuntimeConfig) -> Self {
        Self {
            mode: state.config.node_mode.as_str(),
            node_id: state.node_id(),
            registered: state.identity.is_registered(),
            register_url: state.config.reported_register_url().map(str::to_string),
            allowed_commands: runtime.allowed_commands().iter().cloned().collect(),
            command_timeout: runtime.command_timeout(),
            heartbeat_interval: state.config.heartbeat_interval,
        }
    }
}

/// Current node and execution policy
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let runtime = state.store.read().await;
    Json(ConfigResponse::new(&state, &runtime))
}

#[derive(Deserialize)]
pub struct UpdateConfigRequest {
    register_key: String,
    #[serde(flatten)]
    patch: ConfigPatch,
}

/// Replace the whitelist and/or timeout.
///
/// Returns:
/// - 200: updated config
/// - 400: invalid field values (nothing changed)
/// - 403: wrong register key (nothing changed)
pub async fn update_config(
    State(state): State<AppState>,
    Json(payload): Json<UpdateConfigRequest>,
) -> Result<Json<ConfigResponse>, ApiError> {
    if !state.is_authorized(&payload.register_key) {
        tracing::warn!("Rejected config update with invalid register key");
        return Err(OutpostError::Unauthorized.into());
    }

    let runtime = state.store.replace(payload.patch).await?;
    Ok(Json(ConfigResponse::new(&state, &runtime)))
}
