//! Node lifecycle: registration, heartbeat startup, and shutdown.

use outpost_common::constants::COORDINATOR_REQUEST_TIMEOUT_SECS;
use outpost_common::{LifecycleState, NodeMode, NodeRegistration, OutpostError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{CoordinatorClient, HeartbeatConfig, HeartbeatHandle, HeartbeatScheduler, NodeIdentity};
use crate::config::AppConfig;

/// Drives the node through
/// `Uninitialized → [Registering → Registered] → Running → ShuttingDown → Stopped`.
///
/// Standalone nodes skip registration and heartbeats entirely.
pub struct NodeLifecycle {
    mode: NodeMode,
    state: LifecycleState,
    registration: NodeRegistration,
    client: Option<CoordinatorClient>,
    heartbeat_config: HeartbeatConfig,
    identity: NodeIdentity,
    heartbeat: Option<HeartbeatHandle>,
}

impl NodeLifecycle {
    pub fn new(
        mode: NodeMode,
        registration: NodeRegistration,
        client: Option<CoordinatorClient>,
        heartbeat_config: HeartbeatConfig,
        identity: NodeIdentity,
    ) -> Self {
        Self {
            mode,
            state: LifecycleState::Uninitialized,
            registration,
            client,
            heartbeat_config,
            identity,
            heartbeat: None,
        }
    }

    /// Build from application config. A coordinator client is only created
    /// in worker mode.
    pub fn from_config(config: &AppConfig, identity: NodeIdentity) -> Result<Self, OutpostError> {
        let client = if config.node_mode.is_worker() {
            Some(CoordinatorClient::new(
                config.register_url.clone(),
                config.register_key.clone(),
                Duration::from_secs(COORDINATOR_REQUEST_TIMEOUT_SECS),
            )?)
        } else {
            None
        };

        Ok(Self::new(
            config.node_mode,
            config.registration(),
            client,
            HeartbeatConfig::with_interval(config.heartbeat_interval()),
            identity,
        ))
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn mode(&self) -> NodeMode {
        self.mode
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
    }

    /// Bring the node up. Never fails: a registration failure leaves the
    /// node running unregistered.
    pub async fn start(&mut self) {
        if self.state != LifecycleState::Uninitialized {
            tracing::warn!(state = %self.state, "Lifecycle already started");
            return;
        }

        let client = match (self.mode, self.client.clone()) {
            (NodeMode::Worker, Some(client)) => client,
            (NodeMode::Worker, None) => {
                tracing::warn!(
                    name = %self.registration.name,
                    "⚠️ Mode: worker without coordinator client, registration and heartbeats off"
                );
                self.transition(LifecycleState::Running);
                return;
            }
            (NodeMode::Standalone, _) => {
                tracing::info!(
                    name = %self.registration.name,
                    "🚀 Mode: standalone (execution surface only)"
                );
                self.transition(LifecycleState::Running);
                return;
            }
        };

        tracing::info!(
            name = %self.registration.name,
            host = %self.registration.host,
            coordinator = %client.base_url(),
            "🚀 Mode: worker"
        );

        self.transition(LifecycleState::Registering);
        if let Some(id) = client.register(&self.registration).await {
            self.identity.set(id);
            self.transition(LifecycleState::Registered);
        }

        let scheduler =
            HeartbeatScheduler::new(client, self.identity.clone(), self.heartbeat_config.clone());
        self.heartbeat = Some(scheduler.spawn(CancellationToken::new()));
        self.transition(LifecycleState::Running);
    }

    /// Stop the heartbeat loop (if any) and wait for it to exit
    pub async fn shutdown(&mut self) {
        if self.state == LifecycleState::Stopped {
            return;
        }

        self.transition(LifecycleState::ShuttingDown);
        if let Some(heartbeat) = self.heartbeat.take() {
            if heartbeat.is_finished() {
                tracing::warn!("Heartbeat loop exited before shutdown");
            }
            heartbeat.stop().await;
        }
        self.transition(LifecycleState::Stopped);

        tracing::info!(mode = %self.mode, "👋 Node stopped");
    }
}
