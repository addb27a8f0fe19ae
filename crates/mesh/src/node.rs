//! Single-writer node actor.
//!
//! The actor owns the [`TrickleTimer`] and drains the node's event queue one
//! event at a time. The first interval is started before the queue is read,
//! so nothing that arrives early can observe an uninitialized timer.

use crate::channel::BroadcastChannel;
use crate::event::{EventQueue, EventSender, TrickleValue};
use crate::instrumentation::TrickleObserver;
use crate::random::RandomSource;
use crate::scheduler::TokioScheduler;
use crate::trickle::{TrickleParams, TrickleSnapshot, TrickleTimer};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Tokio actor driving one Trickle state machine.
pub struct TrickleNode<C, R> {
    timer: TrickleTimer<TokioScheduler, C, R>,
    queue: EventQueue,
    snapshots: watch::Sender<TrickleSnapshot>,
}

impl<C, R> TrickleNode<C, R>
where
    C: BroadcastChannel,
    R: RandomSource,
{
    /// Build a node whose timers post into `events`, the sender paired with
    /// `queue`.
    pub fn new(
        params: TrickleParams,
        initial_value: TrickleValue,
        channel: C,
        random: R,
        events: EventSender,
        queue: EventQueue,
    ) -> Self {
        let timer = TrickleTimer::initialize(
            params,
            initial_value,
            TokioScheduler::new(events),
            channel,
            random,
        );
        let (snapshots, _) = watch::channel(timer.snapshot());

        Self {
            timer,
            queue,
            snapshots,
        }
    }

    /// Register an instrumentation observer
    pub fn add_observer(&mut self, observer: Arc<dyn TrickleObserver>) {
        self.timer.add_observer(observer);
    }

    /// Follow the state published after every handled event
    pub fn subscribe(&self) -> watch::Receiver<TrickleSnapshot> {
        self.snapshots.subscribe()
    }

    /// Run until `shutdown` completes or every event sender is gone.
    ///
    /// Returns the final state.
    pub async fn run<F>(mut self, shutdown: F) -> TrickleSnapshot
    where
        F: Future<Output = ()>,
    {
        self.timer.start_interval();
        self.publish();
        info!(
            interval_min_ms = self.timer.interval_min().as_millis() as u64,
            interval_max_ms = self.timer.interval_max().as_millis() as u64,
            k = self.timer.redundancy_k(),
            value = self.timer.current_value(),
            "Trickle node started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("Shutdown requested");
                    break;
                }
                event = self.queue.recv() => match event {
                    Some(event) => {
                        if let Err(err) = self.timer.handle(event) {
                            warn!(?event, error = %err, "Event rejected");
                        }
                        self.publish();
                    }
                    None => break,
                },
            }
        }

        self.timer.cancel_timers();
        let snapshot = self.timer.snapshot();
        info!(
            epoch = snapshot.epoch,
            value = snapshot.current_value,
            transmissions = snapshot.transmissions,
            suppressions = snapshot.suppressions,
            "Trickle node stopped"
        );
        snapshot
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.timer.snapshot());
    }
}
