//! Live, remotely mutable execution policy.

use outpost_common::{ConfigPatch, OutpostError, RuntimeConfig};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the node's `RuntimeConfig`.
///
/// Writers are serialized by the write lock and swap whole fields while
/// holding it, so readers only ever see a fully applied config.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    inner: Arc<RwLock<RuntimeConfig>>,
}

impl ConfigStore {
    pub fn new(initial: RuntimeConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Consistent snapshot of the current config
    pub async fn read(&self) -> RuntimeConfig {
        self.inner.read().await.clone()
    }

    /// Validate `patch`, then apply it atomically.
    ///
    /// On validation failure the store is left untouched.
    pub async fn replace(&self, patch: ConfigPatch) -> Result<RuntimeConfig, OutpostError> {
        if patch.is_empty() {
            return Ok(self.read().await);
        }
        let validated = patch.validate()?;

        let mut config = self.inner.write().await;
        config.apply(validated);

        tracing::info!(
            allowed_commands = ?config.allowed_commands(),
            command_timeout = config.command_timeout(),
            "Runtime config updated"
        );

        Ok(config.clone())
    }
}
