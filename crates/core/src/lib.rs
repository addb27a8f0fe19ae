//! Core functionality shared across the Trickle mesh workspace.
//!
//! This crate provides node configuration, the configuration error type and
//! logging initialization used by the mesh, radio and node crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AdoptionPolicy, Config, LoggingConfig, NodeConfig, RadioConfig, TrickleConfig};
pub use error::{ConfigError, Result};
