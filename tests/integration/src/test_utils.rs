//! Test utilities for multi-node simulations

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use trickle_mesh::{
    event_queue, BroadcastChannel, EventSender, SeededRandom, SignalCounters, TransmitOutcome,
    TrickleNode, TrickleParams, TrickleResult, TrickleSnapshot, TrickleValue,
};

/// Install a test-friendly subscriber once; later calls are ignored.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Member {
    id: usize,
    events: EventSender,
}

#[derive(Default)]
struct MediumState {
    members: Vec<Member>,
    next_id: usize,
}

/// Shared broadcast medium: every frame reaches every other attached node.
#[derive(Clone)]
pub struct InMemoryMedium {
    state: Arc<Mutex<MediumState>>,
    latency: Duration,
    transmissions: Arc<AtomicU64>,
}

impl InMemoryMedium {
    pub fn new(latency: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MediumState::default())),
            latency,
            transmissions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach a node; frames it sends reach everyone else on the medium.
    pub fn attach(&self, events: EventSender) -> MediumPort {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.members.push(Member {
            id,
            events: events.clone(),
        });

        MediumPort {
            id,
            events,
            medium: self.clone(),
        }
    }

    /// Frames sent on the medium so far
    pub fn transmissions(&self) -> u64 {
        self.transmissions.load(Ordering::Relaxed)
    }

    fn peers_of(&self, id: usize) -> Vec<EventSender> {
        let state = self.state.lock().unwrap();
        state
            .members
            .iter()
            .filter(|member| member.id != id)
            .map(|member| member.events.clone())
            .collect()
    }
}

/// One node's attachment to an [`InMemoryMedium`].
pub struct MediumPort {
    id: usize,
    events: EventSender,
    medium: InMemoryMedium,
}

impl BroadcastChannel for MediumPort {
    fn send(&mut self, value: TrickleValue) -> TrickleResult<()> {
        self.medium.transmissions.fetch_add(1, Ordering::Relaxed);
        let peers = self.medium.peers_of(self.id);

        if self.medium.latency.is_zero() {
            for peer in &peers {
                peer.value_received(value);
            }
        } else {
            let latency = self.medium.latency;
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                for peer in &peers {
                    peer.value_received(value);
                }
            });
        }

        self.events.transmit_completed(TransmitOutcome::Acknowledged);
        Ok(())
    }
}

/// A running simulated node.
pub struct SimNode {
    pub snapshots: watch::Receiver<TrickleSnapshot>,
    pub counters: Arc<SignalCounters>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<TrickleSnapshot>,
}

impl SimNode {
    /// Spawn a node on `medium` with a seeded random source.
    pub fn spawn(
        medium: &InMemoryMedium,
        params: TrickleParams,
        initial_value: TrickleValue,
        seed: u64,
    ) -> Self {
        let (events, queue) = event_queue();
        let port = medium.attach(events.clone());
        let counters = Arc::new(SignalCounters::new());

        let mut node = TrickleNode::new(
            params,
            initial_value,
            port,
            SeededRandom::new(seed),
            events,
            queue,
        );
        node.add_observer(counters.clone());
        let snapshots = node.subscribe();

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(node.run(async {
            let _ = stopped.await;
        }));

        Self {
            snapshots,
            counters,
            stop,
            task,
        }
    }

    /// Latest published state
    pub fn state(&self) -> TrickleSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait, in virtual time, until this node holds `value`.
    pub async fn wait_for_value(&mut self, value: TrickleValue, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.snapshots.wait_for(|s| s.current_value == value))
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false)
    }

    /// Stop the node and return its final state.
    pub async fn stop(self) -> TrickleSnapshot {
        let _ = self.stop.send(());
        self.task.await.unwrap()
    }
}
