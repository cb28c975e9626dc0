//! # Outpost Common
//!
//! Shared types, errors, and constants used across Outpost components.
//!
//! ## Modules
//! - `types` - Data model (RuntimeConfig, ExecutionRequest, NodeId, etc.)
//! - `error` - Error taxonomy with HTTP status mapping
//! - `constants` - Defaults and coordinator API paths

pub mod constants;
pub mod error;
pub mod types;

pub use error::OutpostError;
pub use types::*;
