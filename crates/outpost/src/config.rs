//! Configuration management for Outpost.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use outpost_common::constants::{
    DEFAULT_ALLOWED_COMMANDS, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_HEARTBEAT_INTERVAL_SECS,
    DEFAULT_NODE_DESC, DEFAULT_NODE_HOST, DEFAULT_NODE_PORT, DEFAULT_NODE_TAGS,
    DEFAULT_REGISTER_KEY, DEFAULT_REGISTER_URL,
};
use outpost_common::{NodeMode, NodeRegistration, RuntimeConfig, validate_timeout};

/// Application configuration.
///
/// Read once at startup from an optional TOML file, then from environment
/// variables (`ALLOWED_COMMANDS`, `COMMAND_TIMEOUT`, `NODE_MODE`, ...).
/// Only `allowed_commands` and `command_timeout` change afterwards, and
/// those live in the `ConfigStore`, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Initial command whitelist
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,

    /// Initial execution timeout in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout: f64,

    /// standalone or worker
    #[serde(default)]
    pub node_mode: NodeMode,

    /// Coordinator base URL
    #[serde(default = "default_register_url")]
    pub register_url: String,

    /// Shared secret for registration, heartbeats and config updates
    #[serde(default = "default_register_key")]
    pub register_key: String,

    /// Node name reported to the coordinator
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Host advertised to the coordinator
    #[serde(default = "default_node_host")]
    pub node_host: String,

    /// HTTP port (listen and advertised)
    #[serde(default = "default_node_port")]
    pub node_port: u16,

    #[serde(default = "default_node_desc")]
    pub node_desc: String,

    /// Free-form tag string; empty means "no tags"
    #[serde(default = "default_node_tags")]
    pub node_tags: String,

    /// Seconds between heartbeats
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: f64,

    /// HTTP listen address (defaults to 0.0.0.0:{node_port})
    #[serde(default)]
    pub listen_addr: Option<String>,
}

// Default value functions
fn default_allowed_commands() -> Vec<String> {
    DEFAULT_ALLOWED_COMMANDS.iter().map(|c| c.to_string()).collect()
}
fn default_command_timeout() -> f64 { DEFAULT_COMMAND_TIMEOUT_SECS }
fn default_register_url() -> String { DEFAULT_REGISTER_URL.to_string() }
fn default_register_key() -> String { DEFAULT_REGISTER_KEY.to_string() }
fn default_node_host() -> String { DEFAULT_NODE_HOST.to_string() }
fn default_node_port() -> u16 { DEFAULT_NODE_PORT }
fn default_node_desc() -> String { DEFAULT_NODE_DESC.to_string() }
fn default_node_tags() -> String { DEFAULT_NODE_TAGS.to_string() }
fn default_heartbeat_interval() -> f64 { DEFAULT_HEARTBEAT_INTERVAL_SECS }

/// Hostname from `$HOSTNAME` or `/etc/hostname`, else a random name
fn default_node_name() -> String {
    let non_empty = |s: String| {
        let s = s.trim().to_string();
        (!s.is_empty()).then_some(s)
    };

    std::env::var("HOSTNAME")
        .ok()
        .and_then(non_empty)
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok().and_then(non_empty))
        .unwrap_or_else(generate_node_name)
}

fn generate_node_name() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    format!("node-{:08x}", rng.random::<u32>())
}

/// Environment source: flat, case-insensitive names; `ALLOWED_COMMANDS` is
/// comma-separated.
///
/// Values stay strings until deserialization so secrets and names such as
/// `007123` keep their exact text. Numeric fields convert from strings.
fn environment() -> config::Environment {
    config::Environment::default()
        .list_separator(",")
        .with_list_parse_key("allowed_commands")
}

impl AppConfig {
    /// Load configuration from file and environment, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = Self::from_sources(config_path, environment())?;

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = Some(listen.clone());
        }
        if let Some(mode) = args.mode {
            config.node_mode = mode;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_sources(config_path: &str, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(
                path = config_path,
                "Config file not found, using environment and defaults"
            );
        }

        builder
            .add_source(env)
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Reject settings the node cannot run with
    pub fn validate(&self) -> Result<()> {
        self.runtime_config()
            .context("Invalid initial command policy")?;

        validate_timeout(self.heartbeat_interval).map_err(|_| {
            anyhow::anyhow!("heartbeat_interval must be a positive number of seconds")
        })?;

        if self.node_name.trim().is_empty() {
            bail!("node_name must not be empty");
        }
        if self.node_mode.is_worker() && self.register_url.trim().is_empty() {
            bail!("register_url is required in worker mode");
        }
        Ok(())
    }

    /// Initial execution policy for the `ConfigStore`
    pub fn runtime_config(&self) -> Result<RuntimeConfig, outpost_common::OutpostError> {
        RuntimeConfig::new(&self.allowed_commands, self.command_timeout)
    }

    pub fn listen_addr(&self) -> String {
        self.listen_addr
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.node_port))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        // validate() guarantees a representable, positive value
        Duration::try_from_secs_f64(self.heartbeat_interval)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_HEARTBEAT_INTERVAL_SECS))
    }

    /// Coordinator URL as reported by the status endpoints (worker mode only)
    pub fn reported_register_url(&self) -> Option<&str> {
        self.node_mode.is_worker().then_some(self.register_url.as_str())
    }

    /// What this node tells the coordinator about itself
    pub fn registration(&self) -> NodeRegistration {
        let tags = self.node_tags.trim();
        NodeRegistration {
            name: self.node_name.clone(),
            host: self.node_host.clone(),
            port: self.node_port,
            desc: self.node_desc.clone(),
            tags: (!tags.is_empty()).then(|| tags.to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            command_timeout: default_command_timeout(),
            node_mode: NodeMode::default(),
            register_url: default_register_url(),
            register_key: default_register_key(),
            node_name: default_node_name(),
            node_host: default_node_host(),
            node_port: default_node_port(),
            node_desc: default_node_desc(),
            node_tags: default_node_tags(),
            heartbeat_interval: default_heartbeat_interval(),
            listen_addr: None,
        }
    }
}
