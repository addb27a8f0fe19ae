//! Error types for Trickle Mesh operations.
//!
//! None of these halt the state machine: entropy failures fall back to the
//! interval midpoint and transmit failures are retried by the next interval.

use thiserror::Error;

/// Errors that can occur in Trickle operations.
#[derive(Debug, Error)]
pub enum TrickleError {
    /// Timer parameters are unusable
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// An event arrived before the first interval was started
    #[error("Trickle timer not started")]
    NotStarted,

    /// The link layer refused to accept a transmission
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] trickle_core::ConfigError),
}

/// Failures of a [`crate::RandomSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomError {
    /// The entropy source could not produce a value in time
    #[error("Entropy unavailable")]
    EntropyUnavailable,

    /// `hi <= lo`
    #[error("Empty range [{lo}, {hi})")]
    EmptyRange {
        /// Inclusive lower bound
        lo: u64,
        /// Exclusive upper bound
        hi: u64,
    },
}

/// Result type for Trickle operations.
pub type TrickleResult<T> = Result<T, TrickleError>;
