//! HTTP route handlers for Outpost.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use outpost_common::OutpostError;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod config;
mod execute;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(health::healthz))

        // Runtime configuration
        .route("/config", get(config::get_config))
        .route("/config/update", post(config::update_config))

        // Command execution
        .route("/execute", post(execute::execute))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Maps `OutpostError` onto an HTTP response with a `{"detail": ...}` body
#[derive(Debug)]
pub struct ApiError(OutpostError);

impl From<OutpostError> for ApiError {
    fn from(err: OutpostError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::NodeIdentity;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use outpost_common::{NodeId, NodeMode};
    use serde_json::Value;
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    fn test_config(mode: NodeMode) -> AppConfig {
        AppConfig {
            node_mode: mode,
            node_name: "test-node".to_string(),
            register_key: KEY.to_string(),
            register_url: "http://coordinator:8000".to_string(),
            ..Default::default()
        }
    }

    fn app_with(config: AppConfig) -> (Router, AppState) {
        let state = AppState::new(config, NodeIdentity::new()).unwrap();
        (create_router(state.clone()), state)
    }

    fn app() -> Router {
        app_with(test_config(NodeMode::Standalone)).0
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn raw_get(app: &Router, uri: &str) -> Vec<u8> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_healthz_standalone() {
        let app = app();
        let (status, json) = send(&app, Method::GET, "/healthz", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["mode"], "standalone");
        assert_eq!(json["name"], "test-node");
        assert_eq!(json["node_id"], Value::Null);
        assert_eq!(json["registered"], false);
        assert_eq!(json["register_url"], Value::Null);
        assert_eq!(json["allowed_commands"], serde_json::json!(["date", "echo", "ls"]));
        assert_eq!(json["command_timeout"], 15.0);
    }

    #[tokio::test]
    async fn test_healthz_registered_worker() {
        let (app, state) = app_with(test_config(NodeMode::Worker));
        state.identity.set(NodeId::from_json(&serde_json::json!(12)).unwrap());

        let (_, json) = send(&app, Method::GET, "/healthz", None).await;

        assert_eq!(json["mode"], "worker");
        assert_eq!(json["node_id"], "12");
        assert_eq!(json["registered"], true);
        assert_eq!(json["register_url"], "http://coordinator:8000");
    }

    #[tokio::test]
    async fn test_get_config_shape_and_idempotence() {
        let app = app();
        let (status, json) = send(&app, Method::GET, "/config", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["mode"], "standalone");
        assert_eq!(json["heartbeat_interval"], 30.0);
        assert_eq!(json["command_timeout"], 15.0);

        let first = raw_get(&app, "/config").await;
        let second = raw_get(&app, "/config").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_then_get_is_sorted() {
        let app = app();
        let (status, json) = send(
            &app,
            Method::POST,
            "/config/update",
            Some(serde_json::json!({"register_key": KEY, "allowed_commands": ["echo", "date"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["allowed_commands"], serde_json::json!(["date", "echo"]));

        let (_, json) = send(&app, Method::GET, "/config", None).await;
        assert_eq!(json["allowed_commands"], serde_json::json!(["date", "echo"]));
        assert_eq!(json["command_timeout"], 15.0);
    }

    #[tokio::test]
    async fn test_update_timeout_only() {
        let app = app();
        let (status, json) = send(
            &app,
            Method::POST,
            "/config/update",
            Some(serde_json::json!({"register_key": KEY, "command_timeout": 3})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["command_timeout"], 3.0);
        assert_eq!(json["allowed_commands"], serde_json::json!(["date", "echo", "ls"]));
    }

    #[tokio::test]
    async fn test_update_with_wrong_key_is_forbidden() {
        let app = app();
        let before = raw_get(&app, "/config").await;

        let (status, json) = send(
            &app,
            Method::POST,
            "/config/update",
            Some(serde_json::json!({"register_key": "wrong", "allowed_commands": ["rm"]})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!json["detail"].as_str().unwrap().contains(KEY));
        assert_eq!(raw_get(&app, "/config").await, before);
    }

    #[tokio::test]
    async fn test_update_validation_errors() {
        let app = app();
        let before = raw_get(&app, "/config").await;

        for body in [
            serde_json::json!({"register_key": KEY, "allowed_commands": []}),
            serde_json::json!({"register_key": KEY, "allowed_commands": ["rm -rf"]}),
            serde_json::json!({"register_key": KEY, "command_timeout": 0}),
            serde_json::json!({"register_key": KEY, "command_timeout": -2.5}),
            serde_json::json!({
                "register_key": KEY,
                "allowed_commands": ["cat"],
                "command_timeout": -1
            }),
        ] {
            let (status, json) = send(&app, Method::POST, "/config/update", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(json["detail"].is_string());
        }

        assert_eq!(raw_get(&app, "/config").await, before);
    }

    #[tokio::test]
    async fn test_execute_echo() {
        let app = app();
        let (status, json) = send(
            &app,
            Method::POST,
            "/execute",
            Some(serde_json::json!({"command": "echo", "args": ["hi"]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["command"], "echo");
        assert_eq!(json["args"], serde_json::json!(["hi"]));
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["stdout"], "hi\n");
        assert_eq!(json["stderr"], "");
        assert!(json["duration_ms"].is_u64());
    }

    #[tokio::test]
    async fn test_execute_rejections() {
        let app = app();

        let rm = serde_json::json!({"command": "rm"});
        let (status, _) = send(&app, Method::POST, "/execute", Some(rm)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let empty = serde_json::json!({"command": ""});
        let (status, _) = send(&app, Method::POST, "/execute", Some(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_execute_not_found_and_timeout() {
        let mut config = test_config(NodeMode::Standalone);
        config.allowed_commands = vec!["sleep".to_string(), "outpost-missing-tool".to_string()];
        config.command_timeout = 1.0;
        let (app, _) = app_with(config);

        let (status, json) = send(
            &app,
            Method::POST,
            "/execute",
            Some(serde_json::json!({"command": "outpost-missing-tool"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["detail"].is_string());

        let (status, _) = send(
            &app,
            Method::POST,
            "/execute",
            Some(serde_json::json!({"command": "sleep", "args": ["30"]})),
        )
        .await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_update_changes_what_can_execute() {
        let app = app();

        send(
            &app,
            Method::POST,
            "/config/update",
            Some(serde_json::json!({"register_key": KEY, "allowed_commands": ["date"]})),
        )
        .await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/execute",
            Some(serde_json::json!({"command": "echo", "args": ["hi"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let date = serde_json::json!({"command": "date"});
        let (status, json) = send(&app, Method::POST, "/execute", Some(date)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["exit_code"], 0);
    }
}
