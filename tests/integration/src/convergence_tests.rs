//! Convergence tests over an in-memory broadcast medium
//!
//! All tests run in paused virtual time, so interval lengths of several
//! seconds cost nothing and the schedule is reproducible per seed.

use crate::test_utils::{init_test_logging, InMemoryMedium, SimNode};
use std::time::Duration;
use trickle_mesh::TrickleParams;

fn params(doublings: u32, k: u32) -> TrickleParams {
    TrickleParams::new(Duration::from_millis(1000), doublings, k).unwrap()
}

async fn stop_all(nodes: Vec<SimNode>) -> Vec<trickle_mesh::TrickleSnapshot> {
    let mut finals = Vec::with_capacity(nodes.len());
    for node in nodes {
        finals.push(node.stop().await);
    }
    finals
}

#[tokio::test(start_paused = true)]
async fn test_newer_value_floods_network() {
    init_test_logging();
    let medium = InMemoryMedium::new(Duration::ZERO);

    let mut nodes: Vec<SimNode> = (0..4)
        .map(|i| {
            let value = if i == 0 { 9 } else { 0 };
            SimNode::spawn(&medium, params(3, 2), value, 100 + i)
        })
        .collect();

    for node in nodes.iter_mut() {
        assert!(
            node.wait_for_value(9, Duration::from_secs(30)).await,
            "node did not adopt the newer value"
        );
    }

    let seeded = nodes[0].counters.snapshot();
    assert_eq!(seeded.adoptions, 0, "origin never adopts an older value");

    for node in &nodes[1..] {
        let signals = node.counters.snapshot();
        assert_eq!(signals.adoptions, 1);
        assert!(signals.last_adoption_after_ms.is_some());
    }

    let finals = stop_all(nodes).await;
    assert!(finals.iter().all(|s| s.current_value == 9));
}

#[tokio::test(start_paused = true)]
async fn test_consistent_network_suppresses_and_backs_off() {
    init_test_logging();
    let medium = InMemoryMedium::new(Duration::ZERO);

    let nodes: Vec<SimNode> = (0..5)
        .map(|i| SimNode::spawn(&medium, params(4, 1), 3, 200 + i))
        .collect();

    // 1 + 2 + 4 + 8 s of growth, then two full 16 s intervals.
    tokio::time::sleep(Duration::from_secs(47)).await;

    for node in &nodes {
        let signals = node.counters.snapshot();
        assert_eq!(signals.resets, 0, "consistent traffic never resets");
        assert_eq!(signals.adoptions, 0);
        assert_eq!(node.state().current_interval_ms, 16_000);
    }

    let finals = stop_all(nodes).await;
    let transmissions: u64 = finals.iter().map(|s| s.transmissions).sum();
    let suppressions: u64 = finals.iter().map(|s| s.suppressions).sum();

    assert!(suppressions > 0, "k = 1 must suppress redundant nodes");
    // At least one frame per interval, but far fewer than one per node.
    assert!(transmissions >= 6);
    assert!(transmissions < 5 * 6);
    assert_eq!(medium.transmissions(), transmissions);
    assert!(finals.iter().all(|s| s.current_value == 3));
}

#[tokio::test(start_paused = true)]
async fn test_late_joiner_with_newer_value_resets_network() {
    init_test_logging();
    let medium = InMemoryMedium::new(Duration::ZERO);

    let mut nodes: Vec<SimNode> = (0..3)
        .map(|i| SimNode::spawn(&medium, params(3, 2), 0, 300 + i))
        .collect();

    // Long enough for everyone to reach the 8 s maximum.
    tokio::time::sleep(Duration::from_secs(20)).await;
    for node in &nodes {
        assert_eq!(node.state().current_interval_ms, 8_000);
    }

    nodes.push(SimNode::spawn(&medium, params(3, 2), 5, 399));

    for node in nodes.iter_mut() {
        assert!(
            node.wait_for_value(5, Duration::from_secs(5)).await,
            "newer value must spread within the joiner's first interval"
        );
    }

    for node in &nodes[..3] {
        let signals = node.counters.snapshot();
        assert_eq!(signals.adoptions, 1);
        assert!(signals.resets >= 1, "adoption at max interval resets it");
    }

    let finals = stop_all(nodes).await;
    assert!(finals.iter().all(|s| s.current_value == 5));
}

#[tokio::test(start_paused = true)]
async fn test_older_value_never_overrides_newer() {
    init_test_logging();
    let medium = InMemoryMedium::new(Duration::from_millis(5));

    let newer = SimNode::spawn(&medium, params(2, 1), 7, 400);
    let mut older = SimNode::spawn(&medium, params(2, 1), 4, 401);

    assert!(older.wait_for_value(7, Duration::from_secs(10)).await);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(newer.state().current_value, 7);
    assert_eq!(newer.counters.snapshot().adoptions, 0);

    let finals = stop_all(vec![newer, older]).await;
    assert!(finals.iter().all(|s| s.current_value == 7));
}
