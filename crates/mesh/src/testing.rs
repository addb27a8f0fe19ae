//! Test doubles shared by the unit tests.

use crate::channel::BroadcastChannel;
use crate::error::{RandomError, TrickleError, TrickleResult};
use crate::event::{Epoch, TrickleValue};
use crate::instrumentation::{TrickleObserver, TrickleSignal};
use crate::random::RandomSource;
use crate::scheduler::{TimerKind, TimerScheduler};
use rand::RngCore;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScheduledTimer {
    pub id: usize,
    pub delay: Duration,
    pub epoch: Epoch,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
struct SchedulerLog {
    scheduled: Vec<ScheduledTimer>,
    cancelled: Vec<usize>,
}

/// Records timers instead of running them; tests fire events by hand.
#[derive(Debug, Clone, Default)]
pub(crate) struct ManualScheduler {
    log: Arc<Mutex<SchedulerLog>>,
}

impl ManualScheduler {
    pub fn scheduled(&self) -> Vec<ScheduledTimer> {
        self.log.lock().unwrap().scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<usize> {
        self.log.lock().unwrap().cancelled.clone()
    }
}

impl TimerScheduler for ManualScheduler {
    type Handle = usize;

    fn schedule_once(&mut self, delay: Duration, epoch: Epoch, kind: TimerKind) -> usize {
        let mut log = self.log.lock().unwrap();
        let id = log.scheduled.len();
        log.scheduled.push(ScheduledTimer {
            id,
            delay,
            epoch,
            kind,
        });
        id
    }

    fn cancel(&mut self, handle: usize) {
        self.log.lock().unwrap().cancelled.push(handle);
    }
}

#[derive(Debug, Default)]
struct ChannelLog {
    sent: Vec<TrickleValue>,
    fail: bool,
}

/// Captures every accepted transmission.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingChannel {
    log: Arc<Mutex<ChannelLog>>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<TrickleValue> {
        self.log.lock().unwrap().sent.clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.log.lock().unwrap().fail = fail;
    }
}

impl BroadcastChannel for RecordingChannel {
    fn send(&mut self, value: TrickleValue) -> TrickleResult<()> {
        let mut log = self.log.lock().unwrap();
        if log.fail {
            return Err(TrickleError::Transport("radio busy".to_string()));
        }
        log.sent.push(value);
        Ok(())
    }
}

/// Replays scripted results, then always answers with `lo`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRandom {
    script: VecDeque<Result<u64, RandomError>>,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = Result<u64, RandomError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    pub fn lowest() -> Self {
        Self::default()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_in_range(&mut self, lo: u64, _hi: u64) -> Result<u64, RandomError> {
        self.script.pop_front().unwrap_or(Ok(lo))
    }
}

/// Entropy source that refuses the first `failures` reads, then counts up.
#[derive(Debug)]
pub(crate) struct FlakyEntropy {
    failures: u32,
    attempts: u32,
    counter: u64,
}

impl FlakyEntropy {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            attempts: 0,
            counter: 0,
        }
    }

    pub fn offline() -> Self {
        Self::failing(u32::MAX)
    }

    /// Reads attempted so far, failed or not
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl RngCore for FlakyEntropy {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        self.counter
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let bytes = self.next_u64().to_le_bytes();
        for (slot, byte) in dest.iter_mut().zip(bytes.iter().cycle()) {
            *slot = *byte;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.attempts += 1;
        if self.attempts <= self.failures {
            return Err(rand::Error::new("entropy source offline"));
        }
        self.fill_bytes(dest);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    signals: Mutex<Vec<TrickleSignal>>,
}

impl RecordingObserver {
    pub fn signals(&self) -> Vec<TrickleSignal> {
        self.signals.lock().unwrap().clone()
    }

    pub fn doublings(&self) -> usize {
        self.signals()
            .iter()
            .filter(|s| matches!(s, TrickleSignal::IntervalDoubled(_)))
            .count()
    }
}

impl TrickleObserver for RecordingObserver {
    fn observe(&self, signal: &TrickleSignal) {
        self.signals.lock().unwrap().push(*signal);
    }
}
