// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{AdmissionPolicy, Key, Value};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkloadConfigError {
    #[error("key_space must be at least 1")]
    EmptyKeySpace,

    #[error("max_value must be positive, got {0}")]
    NonPositiveMaxValue(Value),

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    pub readers: usize,
    pub writers: usize,
    /// Keys are drawn from `0..key_space`
    pub key_space: Key,
    /// Written values are drawn from `0..max_value`
    pub max_value: Value,
    /// Pause after every operation
    pub pause_ms: u64,
    /// Stop each worker after this many operations
    pub ops_per_worker: Option<u64>,
    /// Stop every worker once this much time has passed
    pub duration_ms: Option<u64>,
    /// Workers allowed to run at once; defaults to all of them
    pub max_concurrency: Option<usize>,
    /// Pace every operation through a shared rate limiter
    pub rate_limit: Option<AdmissionPolicy>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            readers: 100,
            writers: 10,
            key_space: 5,
            max_value: 100,
            pause_ms: 1,
            ops_per_worker: None,
            duration_ms: Some(1_000),
            max_concurrency: None,
            rate_limit: None,
        }
    }
}

impl WorkloadConfig {
    pub fn workers(&self) -> usize {
        self.readers + self.writers
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    pub fn concurrency_ceiling(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| self.workers()).max(1)
    }

    pub fn validate(&self) -> Result<(), WorkloadConfigError> {
        if self.key_space == 0 {
            return Err(WorkloadConfigError::EmptyKeySpace);
        }
        if self.max_value <= 0 {
            return Err(WorkloadConfigError::NonPositiveMaxValue(self.max_value));
        }
        if self.max_concurrency == Some(0) {
            return Err(WorkloadConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}
