//! Set-once node identity shared between the lifecycle and its readers.

use outpost_common::NodeId;
use std::sync::{Arc, OnceLock};

/// Identity assigned by the coordinator.
///
/// Written at most once (by the lifecycle after registration) and read
/// lock-free by the heartbeat loop and the status endpoints.
#[derive(Clone, Debug, Default)]
pub struct NodeIdentity {
    id: Arc<OnceLock<NodeId>>,
}

impl NodeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&NodeId> {
        self.id.get()
    }

    pub fn is_registered(&self) -> bool {
        self.id.get().is_some()
    }

    /// Record the identity. Returns `false` if one was already set; the
    /// existing identity is never replaced.
    pub fn set(&self, id: NodeId) -> bool {
        match self.id.set(id) {
            Ok(()) => true,
            Err(rejected) => {
                tracing::warn!(
                    current = ?self.id.get(),
                    rejected = %rejected,
                    "Node identity already assigned, ignoring"
                );
                false
            }
        }
    }
}
