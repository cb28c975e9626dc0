//! Core types shared across Outpost components.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::error::OutpostError;

/// Operating mode, fixed for the lifetime of the process.
///
/// - `standalone`: execution surface only, never talks to a coordinator
/// - `worker`: registers with a coordinator and sends heartbeats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum NodeMode {
    Standalone,
    #[default]
    Worker,
}

impl NodeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Worker => "worker",
        }
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, Self::Worker)
    }
}

impl fmt::Display for NodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeMode {
    type Err = OutpostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(Self::Standalone),
            "worker" => Ok(Self::Worker),
            other => Err(OutpostError::Config(format!(
                "unknown node mode '{other}' (expected 'standalone' or 'worker')"
            ))),
        }
    }
}

impl TryFrom<String> for NodeMode {
    type Error = OutpostError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Node lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Registering,
    Registered,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Registering => "registering",
            Self::Registered => "registered",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Identifier assigned by the coordinator on registration.
///
/// UUIDs are stored in canonical lowercase hyphenated form, integer ids as
/// their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Normalize the `id` field of a registration response.
    ///
    /// Returns `None` for anything that is neither a UUID string nor an
    /// integer.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Uuid::parse_str(s.trim()).ok().map(Self::from),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|v| v.to_string())
                .or_else(|| n.as_i64().map(|v| v.to_string()))
                .map(Self),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for NodeId {
    fn from(id: Uuid) -> Self {
        Self(id.hyphenated().to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live execution policy: which commands may run and for how long.
///
/// Fields are private so that every instance has passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeConfig {
    allowed_commands: BTreeSet<String>,
    command_timeout: f64,
}

impl RuntimeConfig {
    /// Build a validated config
    pub fn new<I, S>(commands: I, command_timeout: f64) -> Result<Self, OutpostError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            allowed_commands: normalize_commands(commands)?,
            command_timeout: validate_timeout(command_timeout)?,
        })
    }

    /// Whitelisted command names, sorted
    pub fn allowed_commands(&self) -> &BTreeSet<String> {
        &self.allowed_commands
    }

    /// Execution timeout in seconds
    pub fn command_timeout(&self) -> f64 {
        self.command_timeout
    }

    pub fn timeout(&self) -> Duration {
        // validate_timeout guarantees the value is representable
        Duration::from_secs_f64(self.command_timeout)
    }

    /// Exact-match whitelist check
    pub fn allows(&self, command: &str) -> bool {
        self.allowed_commands.contains(command)
    }

    /// Swap in every field present in the patch
    pub fn apply(&mut self, patch: ValidatedPatch) {
        if let Some(commands) = patch.allowed_commands {
            self.allowed_commands = commands;
        }
        if let Some(timeout) = patch.command_timeout {
            self.command_timeout = timeout;
        }
    }
}

/// Partial config update; `None` means "leave this field alone".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub allowed_commands: Option<Vec<String>>,
    #[serde(default)]
    pub command_timeout: Option<f64>,
}

impl ConfigPatch {
    /// Validate every provided field without touching any live config
    pub fn validate(self) -> Result<ValidatedPatch, OutpostError> {
        let allowed_commands = self.allowed_commands.map(normalize_commands).transpose()?;
        let command_timeout = self.command_timeout.map(validate_timeout).transpose()?;
        Ok(ValidatedPatch {
            allowed_commands,
            command_timeout,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_commands.is_none() && self.command_timeout.is_none()
    }
}

/// A patch whose fields have passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPatch {
    allowed_commands: Option<BTreeSet<String>>,
    command_timeout: Option<f64>,
}

/// Trim, drop blanks, de-duplicate. Rejects an empty result and entries
/// with embedded whitespace.
pub fn normalize_commands<I, S>(commands: I) -> Result<BTreeSet<String>, OutpostError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = BTreeSet::new();
    for raw in commands {
        let command = raw.as_ref().trim();
        if command.is_empty() {
            continue;
        }
        if command.chars().any(char::is_whitespace) {
            return Err(OutpostError::Validation(format!(
                "command '{command}' must not contain whitespace"
            )));
        }
        set.insert(command.to_string());
    }

    if set.is_empty() {
        return Err(OutpostError::Validation(
            "allowed_commands must contain at least one command".to_string(),
        ));
    }
    Ok(set)
}

/// Timeout must be finite, strictly positive and fit in a `Duration`
pub fn validate_timeout(secs: f64) -> Result<f64, OutpostError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(OutpostError::Validation(format!(
            "command_timeout must be a positive number of seconds, got {secs}"
        )));
    }
    if Duration::try_from_secs_f64(secs).is_err() {
        return Err(OutpostError::Validation(format!(
            "command_timeout {secs} is too large"
        )));
    }
    Ok(secs)
}

/// Inbound execution request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// Outcome of one completed process run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: String,
    pub args: Vec<String>,
    pub exit_code: i32,
    /// Lossily decoded, invalid bytes replaced with U+FFFD
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// What this node tells the coordinator about itself
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRegistration {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub desc: String,
    pub tags: Option<String>,
}

/// Body of `POST /api/v1/nodes/register`
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub register_key: &'a str,
    pub desc: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a str>,
}

/// Body of `POST /api/v1/nodes/heartbeat`
#[derive(Debug, Serialize)]
pub struct HeartbeatRequest<'a> {
    pub node_id: &'a str,
    pub register_key: &'a str,
}
