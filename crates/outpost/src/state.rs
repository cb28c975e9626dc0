//! Application state and shared resources.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::cluster::NodeIdentity;
use crate::config::AppConfig;
use crate::exec::{CommandExecutor, ConfigStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration (immutable)
    pub config: Arc<AppConfig>,

    /// Live whitelist and timeout
    pub store: ConfigStore,

    /// Subprocess executor bound to `store`
    pub executor: CommandExecutor,

    /// Identity assigned by the coordinator, if any
    pub identity: NodeIdentity,

    /// SHA-256 of the shared register key
    register_key_digest: Arc<[u8]>,
}

impl AppState {
    pub fn new(config: AppConfig, identity: NodeIdentity) -> Result<Self> {
        let runtime = config
            .runtime_config()
            .context("Invalid initial command policy")?;
        let store = ConfigStore::new(runtime);
        let executor = CommandExecutor::new(store.clone());
        let register_key_digest: Arc<[u8]> =
            Sha256::digest(config.register_key.as_bytes()).to_vec().into();

        Ok(Self {
            config: Arc::new(config),
            store,
            executor,
            identity,
            register_key_digest,
        })
    }

    /// Check a caller-supplied key against the shared register key.
    ///
    /// Digests are compared so the comparison time does not depend on how
    /// much of the key matched.
    pub fn is_authorized(&self, key: &str) -> bool {
        let supplied = Sha256::digest(key.as_bytes());
        supplied
            .iter()
            .zip(self.register_key_digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Node id as text, if registered
    pub fn node_id(&self) -> Option<String> {
        self.identity.get().map(|id| id.to_string())
    }
}
