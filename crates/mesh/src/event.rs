//! Tagged events consumed by the Trickle state machine.
//!
//! Timer firings, inbound values and transmit completions all travel through
//! one queue and are dispatched by [`crate::TrickleTimer::handle`].

use crate::channel::TransmitOutcome;
use crate::scheduler::TimerKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// The disseminated value.
pub type TrickleValue = u32;

/// Width of [`TrickleValue`] on the wire, in bytes.
pub const VALUE_WIDTH: usize = std::mem::size_of::<TrickleValue>();

/// Interval generation counter.
///
/// Every interval start, including resets, moves to the next epoch. Timers
/// carry the epoch they were armed under and are ignored once it is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    /// The epoch that follows this one
    pub fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything that can happen to a Trickle node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrickleEvent {
    /// The wait point timer armed under `Epoch` expired
    WaitPointFired(Epoch),
    /// The interval end timer armed under `Epoch` expired
    IntervalEndFired(Epoch),
    /// A value addressed to broadcast on our network was heard
    ValueReceived(TrickleValue),
    /// The link layer finished an earlier transmission
    TransmitCompleted(TransmitOutcome),
}

impl TrickleEvent {
    /// Build the event for a timer of `kind` armed under `epoch`
    pub fn timer_fired(kind: TimerKind, epoch: Epoch) -> Self {
        match kind {
            TimerKind::WaitPoint => TrickleEvent::WaitPointFired(epoch),
            TimerKind::IntervalEnd => TrickleEvent::IntervalEndFired(epoch),
        }
    }
}

/// Producer side of a node's event queue.
///
/// Clones are handed to timers and link layers; the node actor owns the only
/// [`EventQueue`].
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<TrickleEvent>,
}

impl EventSender {
    /// Queue an event. Returns `false` once the node has stopped.
    pub fn send(&self, event: TrickleEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Queue an inbound value that already passed link-layer filtering
    pub fn value_received(&self, value: TrickleValue) -> bool {
        self.send(TrickleEvent::ValueReceived(value))
    }

    /// Queue the outcome of an earlier transmission
    pub fn transmit_completed(&self, outcome: TransmitOutcome) -> bool {
        self.send(TrickleEvent::TransmitCompleted(outcome))
    }

    /// Whether the receiving node has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of a node's event queue. Events come out in arrival order.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<TrickleEvent>,
}

impl EventQueue {
    /// Wait for the next event; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<TrickleEvent> {
        self.rx.recv().await
    }

    /// Take an already queued event without waiting
    pub fn try_recv(&mut self) -> Option<TrickleEvent> {
        self.rx.try_recv().ok()
    }
}

/// Create a connected sender/queue pair for one node.
pub fn event_queue() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventQueue { rx })
}
