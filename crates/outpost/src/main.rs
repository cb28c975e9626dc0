//! # Outpost - Remote Execution Worker Node
//!
//! Runs whitelisted OS commands on behalf of a coordinator. The whitelist
//! and timeout can be replaced at runtime by an authenticated caller.
//!
//! ## Architecture
//! ```text
//! Coordinator ──register/heartbeat──▶ (outbound)
//!      │
//!      └──HTTP──▶ Outpost ──spawn──▶ OS process
//!                    ↓
//!               ConfigStore (whitelist, timeout)
//! ```
//!
//! In `standalone` mode the coordinator is never contacted.

use anyhow::{Context, Result};
use clap::Parser;
use outpost_common::NodeMode;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cluster;
mod config;
mod exec;
mod routes;
mod state;

use cluster::{NodeIdentity, NodeLifecycle};
use config::AppConfig;
use state::AppState;

/// Outpost - remote execution worker node
#[derive(Parser, Debug)]
#[command(name = "outpost")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/outpost.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Operating mode: standalone or worker (overrides NODE_MODE)
    #[arg(long)]
    mode: Option<NodeMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,

    /// Also append plain-text logs to this file
    #[arg(long, env = "LOG_FILE")]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before clap, so `env = ...` args see .env values
    let dotenv_problem = dotenv_problem(dotenvy::dotenv());

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs, args.log_file.as_deref())?;

    if let Some(e) = dotenv_problem {
        tracing::warn!(error = %e, "Failed to load .env file");
    }

    info!("🛰️ Starting Outpost v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!(
        mode = %config.node_mode,
        name = %config.node_name,
        allowed_commands = ?config.allowed_commands,
        command_timeout = config.command_timeout,
        "📋 Configuration loaded"
    );

    let identity = NodeIdentity::new();
    let mut lifecycle = NodeLifecycle::from_config(&config, identity.clone())
        .context("Failed to initialize node lifecycle")?;

    let listen_addr = config.listen_addr();
    let state = AppState::new(config, identity)?;

    // Build router
    let app = routes::create_router(state);

    // Bind before registering so early requests queue instead of failing
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    lifecycle.start().await;
    info!(
        mode = %lifecycle.mode(),
        state = %lifecycle.state(),
        "🚀 Outpost listening on {}",
        listen_addr
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    // Stop heartbeats even if the server failed
    lifecycle.shutdown().await;
    served?;

    info!("👋 Outpost shutdown complete");
    Ok(())
}

/// A missing .env file is fine; anything else is worth a warning
fn dotenv_problem(result: Result<PathBuf, dotenvy::Error>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(e),
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("🛑 Received Ctrl+C, shutting down"),
        _ = terminate => info!("🛑 Received SIGTERM, shutting down"),
    }
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool, log_file: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file = log_file
        .map(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {path}"))
        })
        .transpose()?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .with(file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f))))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .with(file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f))))
            .init();
    }

    Ok(())
}
