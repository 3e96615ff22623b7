// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why a bounded wait gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("wait cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The counterpart that would have unblocked the wait is gone
    #[error("counterpart closed")]
    Closed,
}

/// Optional cancellation token and timeout applied to a blocking operation.
///
/// An unbounded `WaitBound` behaves like the plain operation: it waits for as
/// long as it takes.
#[derive(Debug, Clone, Default)]
pub struct WaitBound {
    cancel: Option<CancellationToken>,
    timeout: Option<Duration>,
}

impl WaitBound {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::default().with_timeout(timeout)
    }

    pub fn cancelled_by(token: CancellationToken) -> Self {
        Self::default().with_cancellation(token)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.cancel.is_none() && self.timeout.is_none()
    }

    /// Drives `fut` to completion unless the token fires or the timeout
    /// elapses first. Cancellation wins over a completion that becomes ready
    /// at the same poll.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, WaitError> {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        let bounded = async {
            match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, fut)
                    .await
                    .map_err(|_| WaitError::DeadlineExceeded),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(WaitError::Cancelled),
            result = bounded => result,
        }
    }
}
