//! Integration tests for multi-node Trickle dissemination
//!
//! This test suite validates:
//! - Propagation of a new value across a shared broadcast medium
//! - Suppression and back-off while the network is consistent
//! - Interval resets when a node with a newer value joins late

pub mod test_utils;

#[cfg(test)]
mod convergence_tests;
