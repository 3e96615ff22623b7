// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How a `RateLimiter` hands out tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// One admission per tick of `period_ms`
    FixedInterval { period_ms: u64 },

    /// Up to `capacity` admissions back to back, refilled one per `period_ms`
    TokenBucket { capacity: usize, period_ms: u64 },
}

impl AdmissionPolicy {
    pub fn period(&self) -> Duration {
        match self {
            AdmissionPolicy::FixedInterval { period_ms }
            | AdmissionPolicy::TokenBucket { period_ms, .. } => Duration::from_millis(*period_ms),
        }
    }

    /// Tokens the bucket can hold
    pub fn capacity(&self) -> usize {
        match self {
            AdmissionPolicy::FixedInterval { .. } => 1,
            AdmissionPolicy::TokenBucket { capacity, .. } => *capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid admission policy '{0}': expected fixed:<ms> or bucket:<capacity>:<ms>")]
pub struct PolicyParseError(pub String);

/// Parses `fixed:<period_ms>` and `bucket:<capacity>:<period_ms>`
impl FromStr for AdmissionPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PolicyParseError(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();

        match parts.as_slice() {
            ["fixed", period] => Ok(AdmissionPolicy::FixedInterval {
                period_ms: period.parse().map_err(|_| invalid())?,
            }),
            ["bucket", capacity, period] => Ok(AdmissionPolicy::TokenBucket {
                capacity: capacity.parse().map_err(|_| invalid())?,
                period_ms: period.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}
