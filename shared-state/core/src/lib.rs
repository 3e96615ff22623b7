// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod atomic_counter;
pub use atomic_counter::{AtomicCounter, OpCounters, OpCountsSnapshot};

mod wait_bound;
pub use wait_bound::{WaitBound, WaitError};

mod key_value_store;
pub use key_value_store::{Key, KeyValueStore, Operation, OperationOutcome, StoreState, Value};

mod store_error;
pub use store_error::StoreError;

mod guarded_store;
pub use guarded_store::GuardedStore;

mod store_request;

mod actor_store;
pub use actor_store::{ActorStore, DEFAULT_REQUEST_CAPACITY};

mod store_backend;
pub use store_backend::{BackendParseError, StoreBackend};

mod admission_policy;
pub use admission_policy::{AdmissionPolicy, PolicyParseError};

mod rate_limiter;
pub use rate_limiter::{RateLimiter, Token};

mod fan_in;
pub use fan_in::{CompletionGuard, FanInCoordinator, FanInError};

mod worker_pool;
pub use worker_pool::{WorkerPool, WorkerPoolError};

pub mod random;
pub use random::Random;

pub mod fastrand_random;
pub use fastrand_random::FastrandRandom;

pub mod timer;
pub use timer::Timer;

pub mod tokio_timer;
pub use tokio_timer::TokioTimer;

mod workload_config;
pub use workload_config::{WorkloadConfig, WorkloadConfigError};

mod workload;
pub use workload::{Workload, WorkloadError, WorkloadReport};
