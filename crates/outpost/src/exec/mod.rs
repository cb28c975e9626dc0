//! Command execution.
//!
//! Implements:
//! - Live whitelist/timeout store (atomically replaceable at runtime)
//! - Subprocess executor bounded by the store's timeout

mod executor;
mod store;

pub use executor::CommandExecutor;
pub use store::ConfigStore;
