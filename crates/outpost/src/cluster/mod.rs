//! Coordinator integration.
//!
//! Implements:
//! - Coordinator HTTP client (registration, heartbeat)
//! - Heartbeat loop with cooperative cancellation
//! - Node lifecycle (standalone vs worker startup, graceful shutdown)

mod client;
mod heartbeat;
mod identity;
mod lifecycle;

pub use client::CoordinatorClient;
pub use heartbeat::{HeartbeatConfig, HeartbeatHandle, HeartbeatScheduler};
pub use identity::NodeIdentity;
pub use lifecycle::NodeLifecycle;
