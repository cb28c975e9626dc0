//! HTTP client for the coordinator's node API.

use outpost_common::constants::coordinator_paths;
use outpost_common::{HeartbeatRequest, NodeId, NodeRegistration, OutpostError, RegisterRequest};
use reqwest::Client;
use std::time::Duration;

/// Coordinator client. Every request is bounded by the client timeout.
#[derive(Clone, Debug)]
pub struct CoordinatorClient {
    base: String,
    register_key: String,
    http: Client,
}

impl CoordinatorClient {
    pub fn new(
        base: impl Into<String>,
        register_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OutpostError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OutpostError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            register_key: register_key.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Register once with the coordinator.
    ///
    /// Failures are logged and reported as `None`; the node keeps running
    /// unregistered.
    pub async fn register(&self, node: &NodeRegistration) -> Option<NodeId> {
        match self.try_register(node).await {
            Ok(id) => {
                tracing::info!(
                    coordinator = %self.base,
                    node_id = %id,
                    "✅ Registered with coordinator"
                );
                Some(id)
            }
            Err(e) => {
                tracing::error!(coordinator = %self.base, error = %e, "❌ Registration failed");
                None
            }
        }
    }

    async fn try_register(&self, node: &NodeRegistration) -> Result<NodeId, OutpostError> {
        let url = format!("{}{}", self.base, coordinator_paths::REGISTER);
        let body = RegisterRequest {
            name: &node.name,
            host: &node.host,
            port: node.port,
            register_key: &self.register_key,
            desc: &node.desc,
            tags: node.tags.as_deref(),
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OutpostError::Registration(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(OutpostError::Registration(format!("{status} {text}")));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| OutpostError::Registration(format!("invalid response body: {e}")))?;

        let raw = data
            .get("id")
            .ok_or_else(|| OutpostError::Registration("response has no 'id' field".to_string()))?;

        NodeId::from_json(raw)
            .ok_or_else(|| OutpostError::Registration(format!("invalid node id {raw}")))
    }

    /// Send a single heartbeat for `node_id`
    pub async fn heartbeat(&self, node_id: &NodeId) -> Result<(), OutpostError> {
        let url = format!("{}{}", self.base, coordinator_paths::HEARTBEAT);
        let body = HeartbeatRequest {
            node_id: node_id.as_str(),
            register_key: &self.register_key,
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OutpostError::Heartbeat(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(OutpostError::Heartbeat(format!("{status} {text}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registration(tags: Option<&str>) -> NodeRegistration {
        NodeRegistration {
            name: "node-a".to_string(),
            host: "10.0.0.5".to_string(),
            port: 8008,
            desc: "Worker Node".to_string(),
            tags: tags.map(str::to_string),
        }
    }

    fn client(server: &MockServer) -> CoordinatorClient {
        CoordinatorClient::new(format!("{}/", server.uri()), "secret", Duration::from_secs(2))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_with_uuid_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/nodes/register"))
            .and(body_json(json!({
                "name": "node-a",
                "host": "10.0.0.5",
                "port": 8008,
                "register_key": "secret",
                "desc": "Worker Node",
                "tags": "worker",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "0B5A2C1E-7D3F-4C8A-9E21-3F6B7A8C9D0E"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).register(&registration(Some("worker"))).await;

        assert_eq!(
            id.map(|id| id.to_string()),
            Some("0b5a2c1e-7d3f-4c8a-9e21-3f6b7a8c9d0e".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_with_integer_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/nodes/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 17})))
            .mount(&server)
            .await;

        let id = client(&server).register(&registration(None)).await;
        assert_eq!(id.map(|id| id.to_string()), Some("17".to_string()));
    }

    #[tokio::test]
    async fn test_register_failures_yield_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/nodes/register"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.register(&registration(None)).await.is_none());

        let err = assert_err!(client.try_register(&registration(None)).await);
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_register_malformed_bodies() {
        for body in [json!({"name": "x"}), json!({"id": "nope"}), json!({"id": null})] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            assert!(client(&server).register(&registration(None)).await.is_none());
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        assert!(client(&server).register(&registration(None)).await.is_none());
    }

    #[tokio::test]
    async fn test_register_unreachable_coordinator() {
        // Nothing listens on the discard port.
        let client =
            CoordinatorClient::new("http://127.0.0.1:9", "secret", Duration::from_secs(1)).unwrap();
        assert!(client.register(&registration(None)).await.is_none());
    }

    #[tokio::test]
    async fn test_register_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 1}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client =
            CoordinatorClient::new(server.uri(), "secret", Duration::from_millis(200)).unwrap();
        assert!(client.register(&registration(None)).await.is_none());
    }

    #[tokio::test]
    async fn test_heartbeat_body_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/nodes/heartbeat"))
            .and(body_json(json!({"node_id": "17", "register_key": "secret"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let id = NodeId::from_json(&json!(17)).unwrap();
        assert_ok!(client(&server).heartbeat(&id).await);
    }

    #[tokio::test]
    async fn test_heartbeat_non_success_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let id = NodeId::from_json(&json!(17)).unwrap();
        let err = assert_err!(client(&server).heartbeat(&id).await);
        assert!(matches!(err, OutpostError::Heartbeat(_)));
    }
}
