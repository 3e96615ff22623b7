// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{AdmissionPolicy, WaitBound, WaitError};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Admission permit handed out by a `RateLimiter`
#[derive(Debug, Clone, Copy)]
pub struct Token {
    issued_at: Instant,
}

impl Token {
    fn issue() -> Self {
        Self {
            issued_at: Instant::now(),
        }
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }
}

/// Admission control backed by a bounded token channel.
///
/// A refill task pushes one token per period with a non-blocking insert;
/// when the channel is full the token is thrown away, so idle time never
/// builds up more than `capacity` tokens. `admit` takes one token, waiting
/// for the next one if the channel is empty. Waiting callers are served in
/// the order they queued.
///
/// * fixed interval: capacity 1, starts empty, so admissions follow the tick
///   cadence.
/// * token bucket: capacity C, starts full, so the first C admissions go
///   through at once and the rest follow the tick cadence.
///
/// Must be created inside a tokio runtime. Periods below one millisecond are
/// raised to one millisecond and a zero capacity is raised to one.
pub struct RateLimiter {
    policy: AdmissionPolicy,
    period: Duration,
    tokens: Mutex<mpsc::Receiver<Token>>,
    stop: CancellationToken,
}

impl RateLimiter {
    pub fn fixed_interval(period: Duration) -> Self {
        let policy = AdmissionPolicy::FixedInterval {
            period_ms: whole_millis(period),
        };
        Self::start(policy, period)
    }

    pub fn token_bucket(capacity: usize, period: Duration) -> Self {
        let policy = AdmissionPolicy::TokenBucket {
            capacity,
            period_ms: whole_millis(period),
        };
        Self::start(policy, period)
    }

    pub fn from_policy(policy: AdmissionPolicy) -> Self {
        Self::start(policy, policy.period())
    }

    /// `period` is the exact refill period; `policy` only carries it in
    /// whole milliseconds
    fn start(policy: AdmissionPolicy, period: Duration) -> Self {
        let capacity = policy.capacity().max(1);
        let prefill = match policy {
            AdmissionPolicy::FixedInterval { .. } => 0,
            AdmissionPolicy::TokenBucket { .. } => capacity,
        };
        let period = period.max(MIN_PERIOD);

        let (tx, rx) = mpsc::channel(capacity);
        for _ in 0..prefill {
            // The channel was just created with room for every prefilled token
            let _ = tx.try_send(Token::issue());
        }

        let stop = CancellationToken::new();
        tokio::spawn(refill(tx, period, stop.clone()));
        debug!(?policy, ?period, "rate limiter started");

        Self {
            policy,
            period,
            tokens: Mutex::new(rx),
            stop,
        }
    }

    /// The policy with its period rounded up to whole milliseconds
    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Exact time between refills
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for the next token
    pub async fn admit(&self) -> Result<Token, WaitError> {
        self.admit_bounded(&WaitBound::unbounded()).await
    }

    /// Waits for the next token unless `bound` gives up first.
    /// A caller that gives up never consumes a token.
    pub async fn admit_bounded(&self, bound: &WaitBound) -> Result<Token, WaitError> {
        bound
            .run(async {
                let mut tokens = self.tokens.lock().await;
                tokens.recv().await.ok_or(WaitError::Closed)
            })
            .await?
    }

    /// Stops refilling. Tokens already in the bucket can still be taken;
    /// after that `admit` fails with `WaitError::Closed`.
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Rounds up, so the reported policy never claims a faster rate
fn whole_millis(period: Duration) -> u64 {
    period.as_micros().div_ceil(1_000) as u64
}

async fn refill(tokens: mpsc::Sender<Token>, period: Duration, stop: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => match tokens.try_send(Token::issue()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => trace!("bucket full, token discarded"),
                Err(TrySendError::Closed(_)) => break,
            },
        }
    }

    debug!("rate limiter refill stopped");
}
