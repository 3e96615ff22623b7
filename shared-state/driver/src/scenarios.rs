// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::cli::{CounterArgs, FanInArgs, RateLimitArgs};
use crate::driver_config::DriverConfig;
use shared_state_core::{
    ActorStore, AtomicCounter, FanInCoordinator, GuardedStore, KeyValueStore, RateLimiter,
    StoreBackend, WaitBound, Workload,
};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

type ScenarioResult = Result<(), Box<dyn Error>>;

pub async fn run_store(config: DriverConfig, shutdown: CancellationToken) -> ScenarioResult {
    let actor = match config.backend {
        StoreBackend::Actor => Some(ActorStore::spawn_with_capacity(config.channel_capacity)),
        StoreBackend::Guarded => None,
    };
    let store: Arc<dyn KeyValueStore> = match &actor {
        Some(actor) => Arc::new(actor.clone()),
        None => Arc::new(GuardedStore::new()),
    };

    println!("Backend: {}", config.backend);
    let report = Workload::with_defaults(config.workload, store)
        .with_cancellation_token(shutdown.child_token())
        .run()
        .await?;

    if let Some(actor) = actor {
        let retained = actor.shutdown().await?;
        info!(keys = retained.len(), "actor store shut down");
    }

    let state: BTreeMap<_, _> = report.final_state.into_iter().collect();
    println!("readOps: {}", report.counts.reads);
    println!("writeOps: {}", report.counts.writes);
    println!("state: {:?}", state);
    println!("elapsed: {:?}", report.elapsed);
    Ok(())
}

pub async fn run_counter(args: CounterArgs) -> ScenarioResult {
    let ops = Arc::new(AtomicCounter::new());
    let completion = FanInCoordinator::new();

    for _ in 0..args.workers {
        let guard = completion.enlist()?;
        let ops = ops.clone();
        let increments = args.increments;
        tokio::spawn(async move {
            let _guard = guard;
            for _ in 0..increments {
                ops.increment();
            }
        });
    }

    completion.wait().await;
    println!("ops: {}", ops.load());
    Ok(())
}

pub async fn run_rate_limit(args: RateLimitArgs, shutdown: CancellationToken) -> ScenarioResult {
    let bound = WaitBound::cancelled_by(shutdown);
    let started = Instant::now();

    let (requests, mut pending) = mpsc::channel(args.requests.max(1));
    for id in 1..=args.requests {
        requests.send(id).await?;
    }
    drop(requests);

    let steady = RateLimiter::fixed_interval(Duration::from_millis(args.interval_ms));
    while let Some(id) = pending.recv().await {
        steady.admit_bounded(&bound).await?;
        println!("request {} {:?}", id, started.elapsed());
    }

    let bursty = RateLimiter::token_bucket(args.burst, Duration::from_millis(args.refill_ms));
    let (requests, mut pending) = mpsc::channel(args.requests.max(1));
    for id in 1..=args.requests {
        requests.send(id).await?;
    }
    drop(requests);

    let started = Instant::now();
    while let Some(id) = pending.recv().await {
        bursty.admit_bounded(&bound).await?;
        println!("request {} {:?}", id, started.elapsed());
    }

    steady.stop();
    bursty.stop();
    Ok(())
}

pub async fn run_fan_in(args: FanInArgs, shutdown: CancellationToken) -> ScenarioResult {
    let completion = FanInCoordinator::new();
    let work = Duration::from_millis(args.work_ms);

    for id in 1..=args.workers {
        let guard = completion.enlist()?;
        tokio::spawn(async move {
            println!("Worker {} starting", id);
            tokio::time::sleep(work).await;
            println!("Worker {} done", id);
            if let Err(e) = guard.complete() {
                warn!(id, "worker completion rejected: {}", e);
            }
        });
    }

    if let Err(e) = completion
        .wait_bounded(&WaitBound::cancelled_by(shutdown))
        .await
    {
        warn!(pending = completion.pending(), "stopped waiting for workers: {}", e);
        return Err(e.into());
    }
    Ok(())
}
