//! Structured logging infrastructure for Trickle nodes.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to `default_level`.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the logging system with human-readable output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, `default_level` is used.
///
/// # Example
/// ```no_run
/// use trickle_core::logging;
///
/// logging::init("info");
/// tracing::info!("Node started");
/// ```
pub fn init(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize the logging system with JSON output for field deployments.
///
/// This format is suitable for log aggregation systems and structured log analysis.
/// Log level can be configured via the `RUST_LOG` environment variable.
///
/// # Example
/// ```no_run
/// use trickle_core::logging;
///
/// logging::init_json("debug");
/// tracing::info!(node_id = "node-001", "Node started");
/// ```
pub fn init_json(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize logging from the `[logging]` section of the node configuration.
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        init_json(&config.level);
    } else {
        init(&config.level);
    }
}
