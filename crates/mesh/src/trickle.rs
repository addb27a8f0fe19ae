//! Trickle timer state machine.
//!
//! Each interval arms two timers under a fresh epoch: a wait point drawn
//! uniformly from the second half of the interval, where the node transmits
//! unless it already heard `k` consistent values, and the interval end, where
//! the interval doubles up to its maximum. Hearing an inconsistent value
//! collapses the interval back to its minimum by starting a new epoch, which
//! turns every timer still in flight into a no-op.

use crate::channel::{BroadcastChannel, TransmitOutcome};
use crate::consistency::{Consistency, ConsistencyEvaluator};
use crate::error::{TrickleError, TrickleResult};
use crate::event::{Epoch, TrickleEvent, TrickleValue};
use crate::instrumentation::{TrickleObserver, TrickleSignal};
use crate::random::RandomSource;
use crate::scheduler::{TimerKind, TimerScheduler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use trickle_core::{AdoptionPolicy, TrickleConfig};

/// Validated timer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrickleParams {
    interval_min_ms: u64,
    interval_max_ms: u64,
    doublings: u32,
    redundancy_k: u32,
    policy: AdoptionPolicy,
}

impl TrickleParams {
    /// Parameters with the default [`AdoptionPolicy::Monotonic`] policy.
    ///
    /// `interval_min` is truncated to whole milliseconds and must be at least
    /// one; `interval_min * 2^doublings` must fit in a `u64` of milliseconds.
    pub fn new(interval_min: Duration, doublings: u32, redundancy_k: u32) -> TrickleResult<Self> {
        let interval_min_ms = u64::try_from(interval_min.as_millis()).map_err(|_| {
            TrickleError::InvalidParameters(format!("interval_min {interval_min:?} too large"))
        })?;

        let config = TrickleConfig {
            interval_min_ms,
            doublings,
            redundancy_k,
            ..TrickleConfig::default()
        };
        Self::from_config(&config)
    }

    /// Parameters from the `[trickle]` configuration section
    pub fn from_config(config: &TrickleConfig) -> TrickleResult<Self> {
        config.validate()?;
        let interval_max_ms = config.interval_max_ms().ok_or_else(|| {
            TrickleError::InvalidParameters("interval_max overflows".to_string())
        })?;

        Ok(Self {
            interval_min_ms: config.interval_min_ms,
            interval_max_ms,
            doublings: config.doublings,
            redundancy_k: config.redundancy_k,
            policy: config.adoption_policy,
        })
    }

    /// Replace the adoption policy
    pub fn with_policy(mut self, policy: AdoptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Smallest interval
    pub fn interval_min(&self) -> Duration {
        Duration::from_millis(self.interval_min_ms)
    }

    /// Largest interval, `interval_min * 2^doublings`
    pub fn interval_max(&self) -> Duration {
        Duration::from_millis(self.interval_max_ms)
    }

    /// Number of doublings from minimum to maximum
    pub fn doublings(&self) -> u32 {
        self.doublings
    }

    /// Redundancy constant k
    pub fn redundancy_k(&self) -> u32 {
        self.redundancy_k
    }

    /// Adoption policy for inconsistent values
    pub fn policy(&self) -> AdoptionPolicy {
        self.policy
    }
}

/// Serializable copy of the timer state, published after every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickleSnapshot {
    /// Current interval generation
    pub epoch: u64,
    /// Current interval length in milliseconds
    pub current_interval_ms: u64,
    /// Offset of this interval's wait point in milliseconds
    pub wait_point_ms: u64,
    /// Consistent values heard this interval
    pub heard_count: u32,
    /// Value being disseminated
    pub current_value: TrickleValue,
    /// Transmissions attempted since startup
    pub transmissions: u64,
    /// Wait points where transmission was suppressed
    pub suppressions: u64,
}

#[derive(Debug)]
struct TrickleState {
    current_interval_ms: u64,
    wait_point_ms: u64,
    heard_count: u32,
    current_value: TrickleValue,
    epoch: Epoch,
    started: bool,
    transmissions: u64,
    suppressions: u64,
}

/// The Trickle state machine.
///
/// Owns its state and collaborators exclusively; every mutation goes through
/// `&mut self`, one event at a time.
pub struct TrickleTimer<S: TimerScheduler, C, R> {
    params: TrickleParams,
    evaluator: ConsistencyEvaluator,
    state: TrickleState,
    scheduler: S,
    channel: C,
    random: R,
    observers: Vec<Arc<dyn TrickleObserver>>,
    armed: Vec<S::Handle>,
}

impl<S, C, R> TrickleTimer<S, C, R>
where
    S: TimerScheduler,
    C: BroadcastChannel,
    R: RandomSource,
{
    /// Set up the state at `interval_min` and epoch 0.
    ///
    /// No timer is armed until [`TrickleTimer::start_interval`].
    pub fn initialize(
        params: TrickleParams,
        initial_value: TrickleValue,
        scheduler: S,
        channel: C,
        random: R,
    ) -> Self {
        Self {
            params,
            evaluator: ConsistencyEvaluator::new(params.policy()),
            state: TrickleState {
                current_interval_ms: params.interval_min_ms,
                wait_point_ms: 0,
                heard_count: 0,
                current_value: initial_value,
                epoch: Epoch::default(),
                started: false,
                transmissions: 0,
                suppressions: 0,
            },
            scheduler,
            channel,
            random,
            observers: Vec::new(),
            armed: Vec::new(),
        }
    }

    /// Register an instrumentation observer
    pub fn add_observer(&mut self, observer: Arc<dyn TrickleObserver>) {
        self.observers.push(observer);
    }

    /// Begin a new interval of the current length under a new epoch.
    pub fn start_interval(&mut self) {
        self.state.epoch = self.state.epoch.next();
        self.state.heard_count = 0;

        let interval = self.state.current_interval_ms;
        let midpoint = interval / 2;
        let wait_point = match self.random.next_in_range(midpoint, interval) {
            Ok(offset) => offset,
            Err(err) => {
                warn!(
                    epoch = %self.state.epoch,
                    error = %err,
                    wait_point_ms = midpoint,
                    "Random source failed, using interval midpoint"
                );
                self.notify(TrickleSignal::EntropyUnavailable);
                midpoint
            }
        };
        debug_assert!(midpoint <= wait_point && wait_point < interval);
        self.state.wait_point_ms = wait_point;

        for handle in self.armed.drain(..) {
            self.scheduler.cancel(handle);
        }

        let epoch = self.state.epoch;
        let wait_timer = self.scheduler.schedule_once(
            Duration::from_millis(wait_point),
            epoch,
            TimerKind::WaitPoint,
        );
        let end_timer = self.scheduler.schedule_once(
            Duration::from_millis(interval),
            epoch,
            TimerKind::IntervalEnd,
        );
        self.armed.push(wait_timer);
        self.armed.push(end_timer);
        self.state.started = true;

        debug!(
            %epoch,
            interval_ms = interval,
            wait_point_ms = wait_point,
            "Interval started"
        );
    }

    /// Transmit unless enough consistent values were heard this interval.
    pub fn on_wait_point_fired(&mut self, epoch: Epoch) {
        if !self.is_current(epoch, TimerKind::WaitPoint) {
            return;
        }

        if self.state.heard_count >= self.params.redundancy_k {
            self.state.suppressions += 1;
            debug!(
                %epoch,
                heard = self.state.heard_count,
                k = self.params.redundancy_k,
                "Transmission suppressed"
            );
            return;
        }

        self.state.transmissions += 1;
        let value = self.state.current_value;
        match self.channel.send(value) {
            Ok(()) => debug!(%epoch, value, heard = self.state.heard_count, "Transmitting"),
            Err(err) => warn!(%epoch, value, error = %err, "Transmission failed"),
        }
    }

    /// Double the interval, clamped to the maximum, and start the next one.
    pub fn on_interval_end_fired(&mut self, epoch: Epoch) {
        if !self.is_current(epoch, TimerKind::IntervalEnd) {
            return;
        }

        let current = self.state.current_interval_ms;
        let next = current.saturating_mul(2).min(self.params.interval_max_ms);
        if next != current {
            self.state.current_interval_ms = next;
            self.notify(TrickleSignal::IntervalDoubled(Duration::from_millis(next)));
        }

        self.start_interval();
    }

    /// Count a consistent value, or adopt and reset on an inconsistent one.
    ///
    /// Ignored until the first interval has started.
    pub fn on_inbound_value(&mut self, received: TrickleValue) {
        if !self.state.started {
            debug!(value = received, "Dropping value received before start");
            return;
        }

        let local = self.state.current_value;
        match self.evaluator.evaluate(local, received) {
            Consistency::Consistent => {
                self.state.heard_count = self.state.heard_count.saturating_add(1);
                trace!(value = received, heard = self.state.heard_count, "Consistent value");
            }
            Consistency::Inconsistent { adopt } => {
                if adopt {
                    self.state.current_value = received;
                    info!(old = local, new = received, "Adopted value");
                    self.notify(TrickleSignal::ValueAdopted {
                        old: local,
                        new: received,
                    });
                } else {
                    debug!(local, received, "Inconsistent value not adopted");
                }

                if self.state.current_interval_ms > self.params.interval_min_ms {
                    self.state.current_interval_ms = self.params.interval_min_ms;
                    info!(
                        stale_epoch = %self.state.epoch,
                        interval_ms = self.params.interval_min_ms,
                        "Inconsistency detected, resetting interval"
                    );
                    self.notify(TrickleSignal::IntervalReset);
                    self.start_interval();
                }
            }
        }
    }

    /// Log the outcome of an earlier transmission. State is unchanged.
    pub fn on_transmit_completed(&mut self, outcome: TransmitOutcome) {
        match outcome {
            TransmitOutcome::Acknowledged => trace!("Transmission acknowledged"),
            TransmitOutcome::NotAcknowledged => {
                debug!("Transmission not acknowledged, next interval will retry")
            }
            TransmitOutcome::TransportError(code) => {
                warn!(code, "Transport error, next interval will retry")
            }
        }
    }

    /// Dispatch one event.
    ///
    /// Fails with [`TrickleError::NotStarted`] before the first interval.
    pub fn handle(&mut self, event: TrickleEvent) -> TrickleResult<()> {
        if !self.state.started {
            return Err(TrickleError::NotStarted);
        }

        match event {
            TrickleEvent::WaitPointFired(epoch) => self.on_wait_point_fired(epoch),
            TrickleEvent::IntervalEndFired(epoch) => self.on_interval_end_fired(epoch),
            TrickleEvent::ValueReceived(value) => self.on_inbound_value(value),
            TrickleEvent::TransmitCompleted(outcome) => self.on_transmit_completed(outcome),
        }
        Ok(())
    }

    /// Cancel every armed timer. Used on shutdown.
    pub fn cancel_timers(&mut self) {
        for handle in self.armed.drain(..) {
            self.scheduler.cancel(handle);
        }
    }

    /// Whether the first interval has been started
    pub fn is_started(&self) -> bool {
        self.state.started
    }

    /// Current interval generation
    pub fn epoch(&self) -> Epoch {
        self.state.epoch
    }

    /// Current interval length
    pub fn current_interval(&self) -> Duration {
        Duration::from_millis(self.state.current_interval_ms)
    }

    /// Wait point offset inside the current interval
    pub fn wait_point(&self) -> Duration {
        Duration::from_millis(self.state.wait_point_ms)
    }

    /// Consistent values heard this interval
    pub fn heard_count(&self) -> u32 {
        self.state.heard_count
    }

    /// Value being disseminated
    pub fn current_value(&self) -> TrickleValue {
        self.state.current_value
    }

    /// Smallest interval
    pub fn interval_min(&self) -> Duration {
        self.params.interval_min()
    }

    /// Largest interval
    pub fn interval_max(&self) -> Duration {
        self.params.interval_max()
    }

    /// Redundancy constant k
    pub fn redundancy_k(&self) -> u32 {
        self.params.redundancy_k
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> TrickleSnapshot {
        TrickleSnapshot {
            epoch: self.state.epoch.0,
            current_interval_ms: self.state.current_interval_ms,
            wait_point_ms: self.state.wait_point_ms,
            heard_count: self.state.heard_count,
            current_value: self.state.current_value,
            transmissions: self.state.transmissions,
            suppressions: self.state.suppressions,
        }
    }

    fn is_current(&self, epoch: Epoch, kind: TimerKind) -> bool {
        if self.state.started && epoch == self.state.epoch {
            return true;
        }
        trace!(%epoch, current = %self.state.epoch, ?kind, "Discarding stale timer");
        false
    }

    fn notify(&self, signal: TrickleSignal) {
        for observer in &self.observers {
            observer.observe(&signal);
        }
    }
}
