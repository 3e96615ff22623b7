// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::driver_config::DriverConfig;
use clap::{Args, Parser, Subcommand};
use shared_state_core::{AdmissionPolicy, StoreBackend};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "shared-state-driver",
    about = "Drives the shared-state concurrency primitives"
)]
pub struct Cli {
    /// JSON configuration for the store workload
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Concurrent readers and writers against one store backend
    Store(StoreArgs),
    /// Many workers incrementing one atomic counter
    Counter(CounterArgs),
    /// Requests paced by a fixed-interval and then a bursty limiter
    RateLimit(RateLimitArgs),
    /// Workers whose completion a single waiter blocks on
    FanIn(FanInArgs),
}

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// guarded | actor
    #[arg(long)]
    pub backend: Option<StoreBackend>,

    #[arg(long)]
    pub readers: Option<usize>,

    #[arg(long)]
    pub writers: Option<usize>,

    /// Operations per worker; without --duration-ms the run has no time limit
    #[arg(long)]
    pub ops: Option<u64>,

    #[arg(long)]
    pub duration_ms: Option<u64>,

    /// fixed:<ms> or bucket:<capacity>:<ms>
    #[arg(long)]
    pub rate_limit: Option<AdmissionPolicy>,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    #[arg(long)]
    pub channel_capacity: Option<usize>,
}

impl StoreArgs {
    /// Flags given on the command line win over the config file
    pub fn apply(&self, config: &mut DriverConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }

        let workload = &mut config.workload;
        if let Some(readers) = self.readers {
            workload.readers = readers;
        }
        if let Some(writers) = self.writers {
            workload.writers = writers;
        }
        if let Some(ops) = self.ops {
            workload.ops_per_worker = Some(ops);
            workload.duration_ms = self.duration_ms;
        } else if let Some(duration_ms) = self.duration_ms {
            workload.duration_ms = Some(duration_ms);
        }
        if let Some(policy) = self.rate_limit {
            workload.rate_limit = Some(policy);
        }
        if let Some(ceiling) = self.max_concurrency {
            workload.max_concurrency = Some(ceiling);
        }
    }
}

#[derive(Args, Debug)]
pub struct CounterArgs {
    #[arg(long, default_value_t = 50)]
    pub workers: usize,

    #[arg(long, default_value_t = 1000)]
    pub increments: u64,
}

#[derive(Args, Debug)]
pub struct RateLimitArgs {
    #[arg(long, default_value_t = 5)]
    pub requests: usize,

    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,

    #[arg(long, default_value_t = 3)]
    pub burst: usize,

    #[arg(long, default_value_t = 200)]
    pub refill_ms: u64,
}

#[derive(Args, Debug)]
pub struct FanInArgs {
    #[arg(long, default_value_t = 5)]
    pub workers: usize,

    /// Simulated work per worker
    #[arg(long, default_value_t = 1000)]
    pub work_ms: u64,
}
