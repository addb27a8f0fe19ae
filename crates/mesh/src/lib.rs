//! Trickle Mesh - adaptive rebroadcast suppression for one shared value
//!
//! Implements the Trickle timer discipline (RFC 6206) that decides, from local
//! timers and overheard traffic alone, when a node on a low-power broadcast
//! link stays quiet, when it transmits, and when it drops back to the fastest
//! rate after hearing disagreement.
//!
//! # Core Components
//!
//! - **RandomSource**: wait point jitter, seeded or OS-backed
//! - **TimerScheduler**: epoch-tagged single-shot timers
//! - **BroadcastChannel**: fire-and-forget transmit seam for link layers
//! - **ConsistencyEvaluator**: consistent/inconsistent classification and adoption
//! - **TrickleTimer**: the suppression state machine
//! - **TrickleNode**: single-writer tokio actor owning the state machine
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use trickle_mesh::{
//!     event_queue, BroadcastChannel, SeededRandom, TrickleNode, TrickleParams,
//!     TrickleResult, TrickleValue,
//! };
//!
//! struct Stdout;
//!
//! impl BroadcastChannel for Stdout {
//!     fn send(&mut self, value: TrickleValue) -> TrickleResult<()> {
//!         println!("broadcast {value}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> TrickleResult<()> {
//! let params = TrickleParams::new(Duration::from_millis(1000), 3, 1)?;
//! let (events, queue) = event_queue();
//! let node = TrickleNode::new(params, 0, Stdout, SeededRandom::new(7), events, queue);
//! let final_state = node.run(tokio::time::sleep(Duration::from_secs(60))).await;
//! println!("epoch {}", final_state.epoch);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod channel;
pub mod consistency;
pub mod error;
pub mod event;
pub mod instrumentation;
pub mod node;
pub mod random;
pub mod scheduler;
pub mod trickle;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use channel::{BroadcastChannel, TransmitOutcome};
pub use consistency::{Consistency, ConsistencyEvaluator};
pub use error::{RandomError, TrickleError, TrickleResult};
pub use event::{event_queue, Epoch, EventQueue, EventSender, TrickleEvent, TrickleValue, VALUE_WIDTH};
pub use instrumentation::{CountersSnapshot, SignalCounters, TracingObserver, TrickleObserver, TrickleSignal};
pub use node::TrickleNode;
pub use random::{OsRandom, RandomSource, SeededRandom, ThreadRandom};
pub use scheduler::{TimerKind, TimerScheduler, TokioScheduler};
pub use trickle::{TrickleParams, TrickleSnapshot, TrickleTimer};
pub use trickle_core::AdoptionPolicy;
