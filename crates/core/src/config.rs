//! Configuration management for Trickle nodes.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
#[cfg(feature = "toml")]
use std::path::Path;

/// Default UDP port used by the datagram radio.
pub const DEFAULT_RADIO_PORT: u16 = 15400;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub node: NodeConfig,
    pub trickle: TrickleConfig,
    pub radio: RadioConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_id: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "node-001".to_string(),
        }
    }
}

/// How a node treats an inbound value that differs from its own.
///
/// Both policies reset the interval on disagreement; they only differ in
/// whether the local value is replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionPolicy {
    /// Adopt only values strictly greater than the local one.
    #[default]
    Monotonic,
    /// Adopt any value that differs from the local one.
    AnyDifference,
}

/// Trickle timer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrickleConfig {
    /// Smallest interval, in milliseconds
    pub interval_min_ms: u64,
    /// Number of times `interval_min_ms` may double
    pub doublings: u32,
    /// Redundancy constant k
    pub redundancy_k: u32,
    /// Value held at startup
    pub initial_value: u32,
    pub adoption_policy: AdoptionPolicy,
    /// Seed for reproducible wait points; `None` draws from the thread rng
    pub rng_seed: Option<u64>,
}

impl Default for TrickleConfig {
    fn default() -> Self {
        Self {
            interval_min_ms: 1000,
            doublings: 10,
            redundancy_k: 5,
            initial_value: 0,
            adoption_policy: AdoptionPolicy::Monotonic,
            rng_seed: None,
        }
    }
}

impl TrickleConfig {
    /// Largest interval in milliseconds, `None` if it does not fit in a `u64`.
    pub fn interval_max_ms(&self) -> Option<u64> {
        let factor = 1u64.checked_shl(self.doublings)?;
        self.interval_min_ms.checked_mul(factor)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_min_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "trickle.interval_min_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.redundancy_k == 0 {
            return Err(ConfigError::Invalid {
                field: "trickle.redundancy_k",
                reason: "must be positive".to_string(),
            });
        }
        if self.interval_max_ms().is_none() {
            return Err(ConfigError::Invalid {
                field: "trickle.doublings",
                reason: format!(
                    "{} ms doubled {} times overflows",
                    self.interval_min_ms, self.doublings
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Local address the datagram radio binds to
    pub bind_addr: SocketAddr,
    /// Destination for broadcast frames
    pub broadcast_addr: SocketAddr,
    pub pan_id: u16,
    pub short_address: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_RADIO_PORT)),
            broadcast_addr: SocketAddr::from(([255, 255, 255, 255], DEFAULT_RADIO_PORT)),
            pan_id: 0xABCD,
            short_address: 0x1540,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node.node_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "node.node_id",
                reason: "must not be empty".to_string(),
            });
        }
        self.trickle.validate()
    }

    pub fn default_config() -> Self {
        Self::default()
    }
}
