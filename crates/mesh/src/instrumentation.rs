//! Instrumentation hooks for state transitions.
//!
//! Observers are told about adoptions, resets, doublings and entropy
//! fallbacks. Nothing they do feeds back into the state machine.

use crate::event::TrickleValue;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// A state transition worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrickleSignal {
    /// The local value was replaced
    ValueAdopted {
        /// Value held before
        old: TrickleValue,
        /// Value held now
        new: TrickleValue,
    },
    /// Disagreement collapsed the interval back to its minimum
    IntervalReset,
    /// The interval grew to the contained length
    IntervalDoubled(Duration),
    /// The random source failed; the wait point fell back to the midpoint
    EntropyUnavailable,
}

/// Receives [`TrickleSignal`]s. Must not block.
pub trait TrickleObserver: Send + Sync {
    /// Called synchronously on every signal
    fn observe(&self, signal: &TrickleSignal);
}

/// Emits every signal as a structured `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    node_id: String,
}

impl TracingObserver {
    /// Create an observer that tags events with `node_id`
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }
}

impl TrickleObserver for TracingObserver {
    fn observe(&self, signal: &TrickleSignal) {
        match signal {
            TrickleSignal::ValueAdopted { old, new } => {
                tracing::info!(node_id = %self.node_id, old, new, "Value adopted");
            }
            TrickleSignal::IntervalReset => {
                tracing::info!(node_id = %self.node_id, "Interval reset");
            }
            TrickleSignal::IntervalDoubled(interval) => {
                tracing::debug!(
                    node_id = %self.node_id,
                    interval_ms = interval.as_millis() as u64,
                    "Interval doubled"
                );
            }
            TrickleSignal::EntropyUnavailable => {
                tracing::warn!(node_id = %self.node_id, "Entropy unavailable");
            }
        }
    }
}

/// Point-in-time copy of [`SignalCounters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountersSnapshot {
    /// Values adopted
    pub adoptions: u64,
    /// Interval resets
    pub resets: u64,
    /// Interval doublings
    pub doublings: u64,
    /// Wait points that fell back to the midpoint
    pub entropy_failures: u64,
    /// Milliseconds from counter creation to the most recent adoption
    pub last_adoption_after_ms: Option<u64>,
}

/// Counts signals; doubles as a propagation-delay probe.
#[derive(Debug)]
pub struct SignalCounters {
    created: Instant,
    adoptions: AtomicU64,
    resets: AtomicU64,
    doublings: AtomicU64,
    entropy_failures: AtomicU64,
    last_adoption: Mutex<Option<Duration>>,
}

impl Default for SignalCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalCounters {
    /// Create zeroed counters; adoption delays are measured from now
    pub fn new() -> Self {
        Self {
            created: Instant::now(),
            adoptions: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            doublings: AtomicU64::new(0),
            entropy_failures: AtomicU64::new(0),
            last_adoption: Mutex::new(None),
        }
    }

    /// Current counter values
    pub fn snapshot(&self) -> CountersSnapshot {
        let last_adoption = self
            .last_adoption
            .lock()
            .map(|guard| *guard)
            .unwrap_or_default();

        CountersSnapshot {
            adoptions: self.adoptions.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            doublings: self.doublings.load(Ordering::Relaxed),
            entropy_failures: self.entropy_failures.load(Ordering::Relaxed),
            last_adoption_after_ms: last_adoption.map(|elapsed| elapsed.as_millis() as u64),
        }
    }
}

impl TrickleObserver for SignalCounters {
    fn observe(&self, signal: &TrickleSignal) {
        match signal {
            TrickleSignal::ValueAdopted { .. } => {
                self.adoptions.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut last) = self.last_adoption.lock() {
                    *last = Some(self.created.elapsed());
                }
            }
            TrickleSignal::IntervalReset => {
                self.resets.fetch_add(1, Ordering::Relaxed);
            }
            TrickleSignal::IntervalDoubled(_) => {
                self.doublings.fetch_add(1, Ordering::Relaxed);
            }
            TrickleSignal::EntropyUnavailable => {
                self.entropy_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
