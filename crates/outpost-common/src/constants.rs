//! Shared constants for Outpost components.

/// Commands allowed when `ALLOWED_COMMANDS` is not set
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &["echo", "date", "ls"];

/// Default per-command wall-clock timeout (seconds)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 15.0;

/// Default coordinator base URL
pub const DEFAULT_REGISTER_URL: &str = "http://localhost:8000";

/// Placeholder shared secret; operators are expected to override it
pub const DEFAULT_REGISTER_KEY: &str = "please-input-your-key";

/// Default advertised host
pub const DEFAULT_NODE_HOST: &str = "127.0.0.1";

/// Default HTTP port (also the advertised port)
pub const DEFAULT_NODE_PORT: u16 = 8008;

/// Default node description sent at registration
pub const DEFAULT_NODE_DESC: &str = "Worker Node";

/// Default node tags sent at registration
pub const DEFAULT_NODE_TAGS: &str = "worker";

/// Default interval between heartbeats (seconds)
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: f64 = 30.0;

/// Grace period before the first heartbeat (seconds)
pub const HEARTBEAT_INITIAL_DELAY_SECS: u64 = 5;

/// Timeout applied to every coordinator request (seconds)
pub const COORDINATOR_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Coordinator API paths, relative to the register URL
pub mod coordinator_paths {
    /// Node registration: returns `{"id": ...}`
    pub const REGISTER: &str = "/api/v1/nodes/register";

    /// Liveness notification
    pub const HEARTBEAT: &str = "/api/v1/nodes/heartbeat";
}
