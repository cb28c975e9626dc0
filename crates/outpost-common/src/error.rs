//! Common error types for Outpost components.

use thiserror::Error;

/// Errors produced by the worker node.
///
/// Every error is scoped to the request or loop iteration that produced it;
/// none of them leave global state behind.
#[derive(Debug, Error)]
pub enum OutpostError {
    /// Bad client input (config update fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wrong shared key on a protected operation
    #[error("Invalid register key")]
    Unauthorized,

    /// Execution request without a command
    #[error("command must not be empty")]
    EmptyCommand,

    /// Command is not in the current whitelist
    #[error("command '{0}' is not in the whitelist")]
    NotWhitelisted(String),

    /// The OS could not locate the executable
    #[error("command '{0}' not found, check that it is installed on this node")]
    CommandNotFound(String),

    /// Process outlived the configured timeout and was killed
    #[error("command timed out after {timeout_secs}s")]
    ExecutionTimeout { timeout_secs: f64 },

    /// Any other launch or runtime fault
    #[error("execution failed: {kind}: {message}")]
    ExecutionFailure { kind: String, message: String },

    /// Registration with the coordinator failed
    #[error("Registration failed: {0}")]
    Registration(String),

    /// A single heartbeat failed
    #[error("Heartbeat failed: {0}")]
    Heartbeat(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OutpostError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized => 403,
            Self::EmptyCommand => 400,
            Self::NotWhitelisted(_) => 400,
            Self::CommandNotFound(_) => 404,
            Self::ExecutionTimeout { .. } => 408,
            Self::ExecutionFailure { .. } => 500,
            Self::Registration(_) => 502,
            Self::Heartbeat(_) => 502,
            Self::Config(_) => 500,
        }
    }

    /// Build an `ExecutionFailure` from an I/O error, keeping its category
    pub fn execution_failure(err: &std::io::Error) -> Self {
        Self::ExecutionFailure {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }
}
