//! Broadcast channel seam between the state machine and a link layer.

use crate::error::TrickleResult;
use crate::event::TrickleValue;
use serde::{Deserialize, Serialize};

/// How a link layer reports a finished transmission.
///
/// The suppression logic treats every variant as "attempt made"; outcomes are
/// only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransmitOutcome {
    /// The link confirmed delivery
    Acknowledged,
    /// The frame went out but nobody acknowledged it
    NotAcknowledged,
    /// The link failed with a driver-specific code
    TransportError(i32),
}

/// Outbound half of the link layer.
///
/// `send` must not block: implementations queue or spawn the transmission and
/// report its completion later as [`crate::TrickleEvent::TransmitCompleted`].
/// Filtering of inbound frames (addressing, network id, short payloads) is
/// the link layer's job; only clean values reach the node.
pub trait BroadcastChannel {
    /// Start broadcasting `value`. An `Err` means the attempt never left.
    fn send(&mut self, value: TrickleValue) -> TrickleResult<()>;
}

impl<C: BroadcastChannel + ?Sized> BroadcastChannel for Box<C> {
    fn send(&mut self, value: TrickleValue) -> TrickleResult<()> {
        (**self).send(value)
    }
}
