//! Link layer for Trickle nodes
//!
//! Broadcast frame encoding with PAN and destination filtering, and a UDP
//! datagram radio implementing [`trickle_mesh::BroadcastChannel`].

#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod radio;

pub use error::{FrameError, RadioError};
pub use frame::{FrameAddress, InboundFrame, BROADCAST_SHORT, FRAME_MAGIC};
pub use radio::UdpRadio;
