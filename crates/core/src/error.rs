//! Core error types

use thiserror::Error;

/// Errors raised while loading or validating node configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::Config`]
    #[cfg(feature = "toml")]
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the node cannot run with
    #[error("Invalid configuration: {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: &'static str,
        /// Human-readable explanation
        reason: String,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
