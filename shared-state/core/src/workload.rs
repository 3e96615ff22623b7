// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{
    FastrandRandom, Key, KeyValueStore, OpCounters, OpCountsSnapshot, Operation,
    OperationOutcome, Random, RateLimiter, StoreError, StoreState, Timer, TokioTimer, Value,
    WaitBound, WaitError, WorkerPool, WorkerPoolError, WorkloadConfig, WorkloadConfigError,
};
use std::iter::repeat;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("invalid workload config: {0}")]
    InvalidConfig(#[from] WorkloadConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pool(#[from] WorkerPoolError),

    #[error("worker task failed: {0}")]
    WorkerFailed(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadReport {
    pub counts: OpCountsSnapshot,
    /// Sum of every value the readers observed
    pub read_total: Value,
    pub final_state: StoreState,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Reader,
    Writer,
}

/// Concurrent readers and writers hammering one `KeyValueStore`.
///
/// Each worker picks a key, performs its operation, records it in the shared
/// `OpCounters` and pauses, optionally waiting for a rate limiter token
/// first. Workers stop after `ops_per_worker` operations, when the run
/// duration elapses, or when the cancellation token fires. An operation
/// interrupted by cancellation is not counted.
pub struct Workload<T: Timer = TokioTimer, R: Random = FastrandRandom> {
    config: WorkloadConfig,
    store: Arc<dyn KeyValueStore>,
    timer: Arc<T>,
    random: Arc<R>,
    limiter: Option<Arc<RateLimiter>>,
    counters: Arc<OpCounters>,
    cancellation_token: CancellationToken,
}

impl Workload {
    pub fn with_defaults(config: WorkloadConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(config, store, TokioTimer, FastrandRandom)
    }
}

impl<T: Timer + 'static, R: Random + 'static> Workload<T, R> {
    pub fn new(config: WorkloadConfig, store: Arc<dyn KeyValueStore>, timer: T, random: R) -> Self {
        Self {
            config,
            store,
            timer: Arc::new(timer),
            random: Arc::new(random),
            limiter: None,
            counters: Arc::new(OpCounters::new()),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Shares an existing limiter; overrides `rate_limit` from the config
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Stops the workload when `token` is cancelled
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Returns a clone of the cancellation token for external control
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn counters(&self) -> Arc<OpCounters> {
        self.counters.clone()
    }

    pub async fn run(self) -> Result<WorkloadReport, WorkloadError> {
        self.config.validate()?;

        let started = self.timer.now();
        info!(
            readers = self.config.readers,
            writers = self.config.writers,
            key_space = self.config.key_space,
            ceiling = self.config.concurrency_ceiling(),
            "workload started"
        );

        let limiter = match (&self.limiter, self.config.rate_limit) {
            (Some(limiter), _) => Some(limiter.clone()),
            (None, Some(policy)) => Some(Arc::new(RateLimiter::from_policy(policy))),
            (None, None) => None,
        };

        let deadline = self.config.duration().map(|duration| {
            let token = self.cancellation_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                debug!(?duration, "workload duration elapsed");
                token.cancel();
            })
        });

        let context = Arc::new(WorkerContext {
            store: self.store.clone(),
            timer: self.timer.clone(),
            random: self.random.clone(),
            limiter,
            counters: self.counters.clone(),
            bound: WaitBound::cancelled_by(self.cancellation_token.clone()),
            key_space: self.config.key_space,
            max_value: self.config.max_value,
            pause: self.config.pause(),
            ops_limit: self.config.ops_per_worker,
        });

        let pool = WorkerPool::new(self.config.concurrency_ceiling());
        let roles = repeat(Role::Reader)
            .take(self.config.readers)
            .chain(repeat(Role::Writer).take(self.config.writers));

        let mut handles = Vec::with_capacity(self.config.workers());
        for (id, role) in roles.enumerate() {
            handles.push(pool.spawn(run_worker(context.clone(), id, role)).await?);
        }
        pool.join().await;

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let mut read_total: Value = 0;
        for handle in handles {
            read_total = read_total.saturating_add(handle.await??);
        }

        let final_state = self.store.snapshot().await?;
        let counts = self.counters.snapshot();
        let elapsed = self.timer.now().saturating_duration_since(started);
        info!(
            reads = counts.reads,
            writes = counts.writes,
            elapsed_ms = elapsed.as_millis() as u64,
            "workload finished"
        );

        Ok(WorkloadReport {
            counts,
            read_total,
            final_state,
            elapsed,
        })
    }
}

struct WorkerContext<T, R> {
    store: Arc<dyn KeyValueStore>,
    timer: Arc<T>,
    random: Arc<R>,
    limiter: Option<Arc<RateLimiter>>,
    counters: Arc<OpCounters>,
    bound: WaitBound,
    key_space: Key,
    max_value: Value,
    pause: Duration,
    ops_limit: Option<u64>,
}

async fn run_worker<T: Timer, R: Random>(
    ctx: Arc<WorkerContext<T, R>>,
    id: usize,
    role: Role,
) -> Result<Value, StoreError> {
    let mut completed: u64 = 0;
    let mut read_total: Value = 0;

    while ctx.ops_limit.map_or(true, |limit| completed < limit) {
        if let Some(limiter) = &ctx.limiter {
            match limiter.admit_bounded(&ctx.bound).await {
                Ok(_) => {}
                Err(WaitError::Cancelled) => break,
                Err(e) => return Err(e.into()),
            }
        }

        let key = ctx.random.key(ctx.key_space);
        let operation = match role {
            Role::Reader => Operation::Read { key },
            Role::Writer => Operation::Write {
                key,
                value: ctx.random.value(ctx.max_value),
            },
        };

        let outcome = match ctx.bound.run(ctx.store.apply(operation)).await {
            Ok(outcome) => outcome?,
            Err(WaitError::Cancelled) => break,
            Err(e) => return Err(e.into()),
        };

        match outcome {
            OperationOutcome::Read(value) => {
                read_total = read_total.saturating_add(value);
                ctx.counters.record_read();
            }
            OperationOutcome::Written => {
                ctx.counters.record_write();
            }
        }
        completed += 1;

        if ctx.bound.run(ctx.timer.sleep(ctx.pause)).await.is_err() {
            break;
        }
    }

    trace!(id, ?role, completed, "worker finished");
    Ok(read_total)
}
