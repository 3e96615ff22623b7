// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shared_state_core::{
    ActorStore, FanInCoordinator, GuardedStore, KeyValueStore, OpCounters, Operation,
    OperationOutcome, StoreError, StoreState, WaitBound, WaitError, Workload, WorkloadConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn backends() -> Vec<(&'static str, Arc<dyn KeyValueStore>)> {
    vec![
        ("guarded", Arc::new(GuardedStore::new())),
        ("actor", Arc::new(ActorStore::spawn())),
    ]
}

fn random_operations(seed: u64, count: usize) -> Vec<Operation> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|_| {
            let key = rng.u32(0..5);
            if rng.bool() {
                Operation::Read { key }
            } else {
                Operation::Write {
                    key,
                    value: rng.i64(0..100),
                }
            }
        })
        .collect()
}

// ============================================================
// Exact operation counts under contention
// ============================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_safety_workload_counts_are_exact_on_both_backends() {
    for (name, store) in backends() {
        let config = WorkloadConfig {
            readers: 20,
            writers: 5,
            pause_ms: 0,
            ops_per_worker: Some(200),
            duration_ms: None,
            ..WorkloadConfig::default()
        };

        let report = Workload::with_defaults(config, store).run().await.unwrap();

        assert_eq!(report.counts.reads, 4_000, "{} lost or duplicated reads", name);
        assert_eq!(report.counts.writes, 1_000, "{} lost or duplicated writes", name);
        assert!(report.final_state.keys().all(|key| *key < 5));
        assert!(report.final_state.values().all(|value| (0..100).contains(value)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_safety_hand_rolled_workers_count_every_operation() {
    for (name, store) in backends() {
        let counters = Arc::new(OpCounters::new());
        let fan_in = FanInCoordinator::new();

        for worker in 0..16u32 {
            let store = store.clone();
            let counters = counters.clone();
            let completion = fan_in.enlist().unwrap();
            tokio::spawn(async move {
                let _completion = completion;
                for i in 0..100 {
                    if worker % 4 == 0 {
                        store.set(worker % 5, i).await.unwrap();
                        counters.record_write();
                    } else {
                        store.get(worker % 5).await.unwrap();
                        counters.record_read();
                    }
                }
            });
        }

        fan_in.wait().await;
        assert_eq!(counters.writes(), 400, "{}", name);
        assert_eq!(counters.reads(), 1_200, "{}", name);
    }
}

// ============================================================
// Ordering
// ============================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_safety_reads_of_single_writer_key_never_go_backwards() {
    for (name, store) in backends() {
        let writers: Vec<_> = (0..5u32)
            .map(|key| {
                let store = store.clone();
                tokio::spawn(async move {
                    for value in 1..=200 {
                        store.set(key, value).await.unwrap();
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..5u32)
            .map(|key| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut last = 0;
                    for _ in 0..200 {
                        let value = store.get(key).await.unwrap();
                        assert!(value >= last, "key {} went from {} to {}", key, last, value);
                        last = value;
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.await.unwrap();
        }

        let state = store.snapshot().await.unwrap();
        assert_eq!(state, (0..5).map(|key| (key, 200)).collect::<StoreState>(), "{}", name);
    }
}

#[tokio::test]
async fn test_safety_set_is_visible_to_every_later_get() {
    for (name, store) in backends() {
        store.set(3, 11).await.unwrap();
        let other = store.clone();
        let seen = tokio::spawn(async move { other.get(3).await }).await.unwrap();
        assert_eq!(seen, Ok(11), "{}", name);
    }
}

// ============================================================
// Backend equivalence
// ============================================================

#[tokio::test]
async fn test_liveness_backends_are_observationally_equivalent() {
    let guarded = GuardedStore::new();
    let actor = ActorStore::spawn();

    for operation in random_operations(42, 500) {
        let left = guarded.apply(operation).await.unwrap();
        let right = actor.apply(operation).await.unwrap();
        assert_eq!(left, right, "diverged on {:?}", operation);
    }

    assert_eq!(
        guarded.snapshot().await.unwrap(),
        actor.snapshot().await.unwrap()
    );
}

#[tokio::test]
async fn test_liveness_absent_keys_read_zero_on_both_backends() {
    for (name, store) in backends() {
        assert_eq!(
            store.apply(Operation::Read { key: 4 }).await,
            Ok(OperationOutcome::Read(0)),
            "{}",
            name
        );
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}

// ============================================================
// ActorStore shutdown and bounded calls
// ============================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_safety_shutdown_answers_queued_requests_and_keeps_their_writes() {
    let store = ActorStore::spawn_with_capacity(16);

    let writers: Vec<_> = (0..32u32)
        .map(|key| {
            let store = store.clone();
            tokio::spawn(async move { (key, store.set(key, i64::from(key) + 100).await) })
        })
        .collect();

    tokio::task::yield_now().await;
    let final_state = store.shutdown().await.unwrap();

    for handle in writers {
        let (key, result) = timeout(Duration::from_secs(5), handle)
            .await
            .expect("writer hung after shutdown")
            .unwrap();
        match result {
            Ok(()) => assert_eq!(final_state.get(&key), Some(&(i64::from(key) + 100))),
            Err(e) => assert_eq!(e, StoreError::Closed),
        }
    }
}

#[tokio::test]
async fn test_safety_calls_after_shutdown_fail_fast() {
    let store = ActorStore::spawn();
    store.set(0, 1).await.unwrap();
    let state = store.shutdown().await.unwrap();
    assert_eq!(state, StoreState::from([(0, 1)]));

    let get = timeout(Duration::from_secs(1), store.get(0)).await;
    assert_eq!(get, Ok(Err(StoreError::Closed)));
    let set = timeout(Duration::from_secs(1), store.set(0, 2)).await;
    assert_eq!(set, Ok(Err(StoreError::Closed)));
    assert_eq!(store.snapshot().await, Err(StoreError::Closed));
}

#[tokio::test]
async fn test_liveness_bounded_call_reports_cancellation() {
    let store = ActorStore::spawn();
    let token = CancellationToken::new();
    token.cancel();

    let result = store.get_bounded(1, &WaitBound::cancelled_by(token)).await;
    assert_eq!(result, Err(StoreError::Wait(WaitError::Cancelled)));

    let result = store
        .set_bounded(1, 5, &WaitBound::timeout(Duration::from_secs(1)))
        .await;
    assert_eq!(result, Ok(()));
    assert_eq!(store.get(1).await, Ok(5));
}
