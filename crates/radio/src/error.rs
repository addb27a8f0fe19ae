//! Error types for the link layer.

use thiserror::Error;

/// Reasons an inbound frame never reaches the Trickle node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Shorter than its own header
    #[error("Frame truncated: {len} bytes")]
    Truncated {
        /// Bytes received
        len: usize,
    },

    /// First byte is not [`crate::FRAME_MAGIC`]
    #[error("Bad magic byte: {0:#04x}")]
    BadMagic(u8),

    /// Addressing mode is neither short nor long
    #[error("Unknown addressing mode: {0:#04x}")]
    UnknownAddressMode(u8),

    /// Addressed to another PAN
    #[error("PAN mismatch: expected {expected:#06x}, got {actual:#06x}")]
    PanMismatch {
        /// Our PAN
        expected: u16,
        /// PAN in the frame
        actual: u16,
    },

    /// Destination is a unicast address
    #[error("Frame not addressed to broadcast")]
    NotBroadcast,

    /// Payload cannot hold a full value
    #[error("Payload too short: {len} bytes")]
    ShortPayload {
        /// Payload bytes present
        len: usize,
    },
}

/// Errors from the datagram radio.
#[derive(Debug, Error)]
pub enum RadioError {
    /// Socket bind, option or address failure
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),
}
