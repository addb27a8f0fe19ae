//! Consistency classification of overheard values.

use crate::event::TrickleValue;
use trickle_core::AdoptionPolicy;

/// Verdict on an inbound value relative to the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    /// Same value: counts toward suppression
    Consistent,
    /// Different value: resets the interval; `adopt` says whether to take it
    Inconsistent {
        /// Replace the local value with the inbound one
        adopt: bool,
    },
}

/// Compares inbound values against the local one under an [`AdoptionPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsistencyEvaluator {
    policy: AdoptionPolicy,
}

impl ConsistencyEvaluator {
    /// Create an evaluator with the given adoption policy
    pub fn new(policy: AdoptionPolicy) -> Self {
        Self { policy }
    }

    /// Active adoption policy
    pub fn policy(&self) -> AdoptionPolicy {
        self.policy
    }

    /// Classify `received` against `local`
    pub fn evaluate(&self, local: TrickleValue, received: TrickleValue) -> Consistency {
        if received == local {
            return Consistency::Consistent;
        }

        let adopt = match self.policy {
            // Stale rebroadcasts of an older value must not regress us.
            AdoptionPolicy::Monotonic => received > local,
            AdoptionPolicy::AnyDifference => true,
        };

        Consistency::Inconsistent { adopt }
    }
}
