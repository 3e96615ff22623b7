// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shared_state_core::{
    ActorStore, AdmissionPolicy, GuardedStore, Key, KeyValueStore, Random, RateLimiter,
    Timer, Value, Workload, WorkloadConfig, WorkloadConfigError, WorkloadError,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};

/// Cycles through the key space and always writes the same value
struct CyclingRandom {
    next_key: AtomicU32,
    value: Value,
}

impl CyclingRandom {
    fn new(value: Value) -> Self {
        Self {
            next_key: AtomicU32::new(0),
            value,
        }
    }
}

impl Random for CyclingRandom {
    fn key(&self, key_space: Key) -> Key {
        self.next_key.fetch_add(1, Ordering::SeqCst) % key_space
    }

    fn value(&self, _max_value: Value) -> Value {
        self.value
    }
}

struct NoPauseTimer;

/// Never pauses and never lets time pass
struct FrozenTimer {
    at: Instant,
}

#[async_trait::async_trait]
impl Timer for FrozenTimer {
    async fn sleep(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }

    fn now(&self) -> Instant {
        self.at
    }
}

#[async_trait::async_trait]
impl Timer for NoPauseTimer {
    async fn sleep(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}

fn bounded_config(readers: usize, writers: usize, ops: u64) -> WorkloadConfig {
    WorkloadConfig {
        readers,
        writers,
        pause_ms: 0,
        ops_per_worker: Some(ops),
        duration_ms: None,
        ..WorkloadConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_liveness_injected_random_drives_final_state() {
    let store: Arc<dyn KeyValueStore> = Arc::new(ActorStore::spawn());
    let workload = Workload::new(
        bounded_config(3, 2, 50),
        store,
        NoPauseTimer,
        CyclingRandom::new(7),
    );

    let report = workload.run().await.unwrap();

    assert_eq!(report.counts.reads, 150);
    assert_eq!(report.counts.writes, 100);
    assert!(!report.final_state.is_empty());
    assert!(report
        .final_state
        .iter()
        .all(|(key, value)| *key < 5 && *value == 7));
    assert!(report.read_total <= 150 * 7);
    assert_eq!(report.read_total % 7, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_liveness_duration_bounds_an_open_ended_run() {
    let config = WorkloadConfig {
        readers: 8,
        writers: 2,
        duration_ms: Some(100),
        ..WorkloadConfig::default()
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(GuardedStore::new());

    let report = timeout(
        Duration::from_secs(5),
        Workload::with_defaults(config, store).run(),
    )
    .await
    .expect("workload ignored its duration")
    .unwrap();

    assert!(report.counts.reads > 0);
    assert!(report.counts.writes > 0);
    assert!(report.elapsed >= Duration::from_millis(100));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_liveness_external_cancellation_stops_workers() {
    let config = WorkloadConfig {
        readers: 4,
        writers: 4,
        duration_ms: None,
        ..WorkloadConfig::default()
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(ActorStore::spawn());
    let workload = Workload::with_defaults(config, store);
    let token = workload.cancellation_token();
    let counters = workload.counters();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let report = timeout(Duration::from_secs(5), workload.run())
        .await
        .expect("workload ignored cancellation")
        .unwrap();
    assert_eq!(report.counts, counters.snapshot());
    assert!(report.counts.total() > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_liveness_ceiling_below_worker_count_still_runs_everyone() {
    let config = WorkloadConfig {
        max_concurrency: Some(2),
        ..bounded_config(6, 3, 20)
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(GuardedStore::new());

    let report = Workload::with_defaults(config, store).run().await.unwrap();
    assert_eq!(report.counts.reads, 120);
    assert_eq!(report.counts.writes, 60);
}

#[tokio::test(start_paused = true)]
async fn test_liveness_rate_limited_workload_follows_the_bucket() {
    let config = WorkloadConfig {
        rate_limit: Some(AdmissionPolicy::TokenBucket {
            capacity: 2,
            period_ms: 50,
        }),
        ..bounded_config(1, 0, 5)
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(GuardedStore::new());

    let report = Workload::new(config, store, NoPauseTimer, CyclingRandom::new(1))
        .run()
        .await
        .unwrap();

    // Two from the burst, three more at 50, 100 and 150 ms
    assert_eq!(report.counts.reads, 5);
    assert!(report.elapsed >= Duration::from_millis(150));
}

#[tokio::test(start_paused = true)]
async fn test_liveness_shared_limiter_paces_every_worker() {
    let limiter = Arc::new(RateLimiter::fixed_interval(Duration::from_millis(10)));
    let store: Arc<dyn KeyValueStore> = Arc::new(GuardedStore::new());

    let report = Workload::new(
        bounded_config(2, 2, 3),
        store,
        NoPauseTimer,
        CyclingRandom::new(3),
    )
    .with_rate_limiter(limiter)
    .run()
    .await
    .unwrap();

    assert_eq!(report.counts.total(), 12);
    assert!(report.elapsed >= Duration::from_millis(120));
}

#[tokio::test]
async fn test_safety_elapsed_time_comes_from_the_timer() {
    let store: Arc<dyn KeyValueStore> = Arc::new(GuardedStore::new());
    let timer = FrozenTimer { at: Instant::now() };

    tokio::time::sleep(Duration::from_millis(5)).await;
    let report = Workload::new(bounded_config(2, 1, 10), store, timer, CyclingRandom::new(4))
        .run()
        .await
        .unwrap();

    assert_eq!(report.counts.total(), 30);
    assert_eq!(report.elapsed, Duration::ZERO);
}

#[tokio::test]
async fn test_safety_invalid_config_is_rejected() {
    let config = WorkloadConfig {
        key_space: 0,
        ..WorkloadConfig::default()
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(GuardedStore::new());

    let result = Workload::with_defaults(config, store).run().await;
    assert!(matches!(
        result,
        Err(WorkloadError::InvalidConfig(WorkloadConfigError::EmptyKeySpace))
    ));
}

#[tokio::test]
async fn test_safety_closed_store_fails_the_run() {
    let actor = ActorStore::spawn();
    actor.shutdown().await.unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(actor);

    let result = Workload::with_defaults(bounded_config(1, 1, 3), store)
        .run()
        .await;
    assert!(matches!(result, Err(WorkloadError::Store(_))));
}
