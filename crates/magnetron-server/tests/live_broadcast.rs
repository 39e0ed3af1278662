//! Cross-instance fan-out tests against a live store.
//!
//! These tests simulate two service instances by creating two
//! independent store connections, app states, and relay tasks over the
//! same Redis instance, then assert that a mutation performed on one
//! instance reaches viewers subscribed on both. Run with:
//!
//! ```bash
//! docker run --rm -d -p 6379:6379 redis:7-alpine
//! cargo test -p magnetron-server -- --ignored --test-threads=1
//! ```

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use magnetron_core::StateEngine;
use magnetron_server::{hub, AppState, AuthGuard};
use magnetron_store::StorePool;
use magnetron_types::{Snapshot, Status};

const REDIS_URL: &str = "redis://localhost:6379";
const TIMEOUT: Duration = Duration::from_secs(2);
const SECRET: &str = "broadcast-test-secret";

/// Build one simulated service instance: its own store connection,
/// app state, and running relay.
async fn make_instance() -> Arc<AppState> {
    let pool = StorePool::connect(REDIS_URL, TIMEOUT)
        .await
        .expect("Failed to connect to Redis -- is Docker running?");
    let state = Arc::new(AppState::new(
        StateEngine::new(pool),
        AuthGuard::new(SECRET),
    ));
    let _relay = hub::spawn_relay(Arc::clone(&state))
        .await
        .expect("Failed to start relay");
    state
}

async fn recv_snapshot(rx: &mut tokio::sync::broadcast::Receiver<Snapshot>) -> Snapshot {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("Timed out waiting for snapshot")
        .expect("Broadcast channel closed")
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn both_instances_receive_a_mutation_made_on_one() {
    let instance_a = make_instance().await;
    let instance_b = make_instance().await;
    instance_a
        .engine
        .pool()
        .flush_all()
        .await
        .expect("Failed to flush");

    let mut viewer_a = instance_a.subscribe();
    let mut viewer_b = instance_b.subscribe();

    // One mutation on instance A from the zero state.
    let expected = instance_a
        .engine
        .increase_power()
        .await
        .expect("increase failed");
    assert_eq!(expected.power, 10);

    // Viewers on both instances converge on the identical snapshot.
    let snapshot_a = recv_snapshot(&mut viewer_a).await;
    let snapshot_b = recv_snapshot(&mut viewer_b).await;
    assert_eq!(snapshot_a, expected);
    assert_eq!(snapshot_b, expected);
    assert_eq!(snapshot_a.status, Status::On);
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn one_viewer_sees_snapshots_in_mutation_order() {
    let instance_a = make_instance().await;
    let instance_b = make_instance().await;
    instance_a
        .engine
        .pool()
        .flush_all()
        .await
        .expect("Failed to flush");

    let mut viewer = instance_b.subscribe();

    // Three sequential mutations on the other instance.
    for _ in 0..3 {
        let _ = instance_a
            .engine
            .increase_power()
            .await
            .expect("increase failed");
    }

    // The viewer's stream preserves per-connection ordering.
    assert_eq!(recv_snapshot(&mut viewer).await.power, 10);
    assert_eq!(recv_snapshot(&mut viewer).await.power, 20);
    assert_eq!(recv_snapshot(&mut viewer).await.power, 30);
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn ticker_driven_changes_reach_viewers_too() {
    let instance = make_instance().await;
    instance
        .engine
        .pool()
        .flush_all()
        .await
        .expect("Failed to flush");

    let _ = instance
        .engine
        .pool()
        .adjust_counter(5)
        .await
        .expect("seed failed");

    let mut viewer = instance.subscribe();

    // A tick publishes like any other mutation.
    let expected = instance.engine.tick_down().await.expect("tick failed");
    assert_eq!(expected.counter, 4);
    assert_eq!(recv_snapshot(&mut viewer).await, expected);
}
