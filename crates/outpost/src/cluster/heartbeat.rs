//! Periodic liveness notifications to the coordinator.
//!
//! After an initial grace period (so registration can finish) the loop
//! alternates between sending one heartbeat and sleeping for the configured
//! interval. The interval is measured from the end of each attempt.
//!
//! Failures never stop the loop; the next attempt is the retry. The loop only
//! ends when its cancellation token fires, and it never sends after that.

use outpost_common::constants::HEARTBEAT_INITIAL_DELAY_SECS;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{CoordinatorClient, NodeIdentity};

/// Heartbeat timing
#[derive(Clone, Debug)]
pub struct HeartbeatConfig {
    /// Wait before the first heartbeat
    pub initial_delay: Duration,
    /// Pause between the end of one attempt and the next
    pub interval: Duration,
}

impl HeartbeatConfig {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            initial_delay: Duration::from_secs(HEARTBEAT_INITIAL_DELAY_SECS),
            interval,
        }
    }
}

/// Background heartbeat loop
pub struct HeartbeatScheduler {
    client: CoordinatorClient,
    identity: NodeIdentity,
    config: HeartbeatConfig,
}

impl HeartbeatScheduler {
    pub fn new(client: CoordinatorClient, identity: NodeIdentity, config: HeartbeatConfig) -> Self {
        Self {
            client,
            identity,
            config,
        }
    }

    /// Start the loop on its own task
    pub fn spawn(self, token: CancellationToken) -> HeartbeatHandle {
        let task = tokio::spawn(self.run(token.clone()));
        HeartbeatHandle { token, task }
    }

    /// Run until `token` is cancelled
    pub async fn run(self, token: CancellationToken) {
        tracing::info!(
            interval = ?self.config.interval,
            initial_delay = ?self.config.initial_delay,
            "💓 Heartbeat loop started"
        );

        if sleep_or_cancel(&token, self.config.initial_delay).await {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = self.beat() => {}
                }

                if !sleep_or_cancel(&token, self.config.interval).await {
                    break;
                }
            }
        }

        tracing::info!("💓 Heartbeat loop stopped");
    }

    /// One heartbeat attempt; all outcomes are logged and swallowed
    async fn beat(&self) {
        let Some(node_id) = self.identity.get() else {
            tracing::warn!("⚠️ Node not registered, skipping heartbeat");
            return;
        };

        match self.client.heartbeat(node_id).await {
            Ok(()) => tracing::info!(
                node_id = %node_id,
                sent_at = %chrono::Utc::now().to_rfc3339(),
                "💓 Heartbeat sent"
            ),
            Err(e) => tracing::error!(node_id = %node_id, error = %e, "❌ Heartbeat failed"),
        }
    }
}

/// Sleep for `duration`; returns `false` if cancelled first.
async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Handle to a running heartbeat loop
pub struct HeartbeatHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal cancellation and wait for the loop to exit
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Heartbeat task terminated abnormally");
        }
    }
}
