//! Epoch-tagged single-shot timers.

use crate::event::{Epoch, EventSender, TrickleEvent};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Which of the two per-interval timers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Possible transmission inside the interval
    WaitPoint,
    /// End of the interval
    IntervalEnd,
}

/// Schedules delayed single-shot timer events.
///
/// A timer armed with `(epoch, kind)` fires at most once. Cancelling is an
/// optimization only: the state machine ignores firings from stale epochs.
pub trait TimerScheduler {
    /// Handle identifying an armed timer
    type Handle;

    /// Arm a timer that fires once after `delay`
    fn schedule_once(&mut self, delay: Duration, epoch: Epoch, kind: TimerKind) -> Self::Handle;

    /// Best-effort cancellation; the default does nothing
    fn cancel(&mut self, _handle: Self::Handle) {}
}

/// Runs each timer as a tokio task that posts into the node's event queue.
///
/// Must be driven from inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    events: EventSender,
}

impl TokioScheduler {
    /// Create a scheduler posting into `events`
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl TimerScheduler for TokioScheduler {
    type Handle = JoinHandle<()>;

    fn schedule_once(&mut self, delay: Duration, epoch: Epoch, kind: TimerKind) -> Self::Handle {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !events.send(TrickleEvent::timer_fired(kind, epoch)) {
                tracing::trace!(%epoch, ?kind, "Timer fired after node stopped");
            }
        })
    }

    fn cancel(&mut self, handle: Self::Handle) {
        handle.abort();
    }
}
