// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{WaitBound, WaitError};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

/// Misuse of a `FanInCoordinator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FanInError {
    /// `done` was called more times than `add` registered
    #[error("done() called with no pending units")]
    NegativeCount,

    /// `add` while a waiter is already blocked on an unfinished group
    #[error("add({added}) while a waiter is blocked on {pending} pending units")]
    AddWhileWaiting { added: usize, pending: usize },

    #[error("pending count overflow")]
    Overflow,
}

/// Blocks a waiter until a known number of units of work have completed.
///
/// `add(n)` registers units, each unit calls `done()` exactly once, and
/// `wait()` returns once the pending count is back at zero. Every waiter
/// blocked at that moment is released. Usage violations are reported as
/// errors and logged; the count is never clamped.
///
/// Clones share the same pending count.
#[derive(Clone)]
pub struct FanInCoordinator {
    group: Arc<watch::Sender<GroupCount>>,
}

/// Pending units, the waiters blocked on them, and how many groups have
/// drained so far. A waiter that misses the zero still sees the generation
/// move on.
#[derive(Debug, Clone, Copy, Default)]
struct GroupCount {
    pending: usize,
    waiters: usize,
    generation: u64,
}

impl FanInCoordinator {
    pub fn new() -> Self {
        let (group, _) = watch::channel(GroupCount::default());
        Self {
            group: Arc::new(group),
        }
    }

    pub fn pending(&self) -> usize {
        self.group.borrow().pending
    }

    pub fn add(&self, n: usize) -> Result<(), FanInError> {
        if n == 0 {
            return Ok(());
        }

        let mut outcome = Ok(());
        self.group.send_if_modified(|group| {
            if group.pending > 0 && group.waiters > 0 {
                outcome = Err(FanInError::AddWhileWaiting {
                    added: n,
                    pending: group.pending,
                });
                return false;
            }
            match group.pending.checked_add(n) {
                Some(next) => group.pending = next,
                None => outcome = Err(FanInError::Overflow),
            }
            false
        });

        if let Err(e) = &outcome {
            error!(error = %e, "fan-in usage violation");
        }
        outcome
    }

    /// Marks one unit as complete, waking the waiters when it was the last
    pub fn done(&self) -> Result<(), FanInError> {
        let mut outcome = Ok(());
        self.group
            .send_if_modified(|group| match group.pending.checked_sub(1) {
                Some(0) => {
                    // Everyone blocked on this group is released
                    group.pending = 0;
                    group.waiters = 0;
                    group.generation = group.generation.wrapping_add(1);
                    true
                }
                Some(next) => {
                    group.pending = next;
                    false
                }
                None => {
                    outcome = Err(FanInError::NegativeCount);
                    false
                }
            });

        if let Err(e) = &outcome {
            error!(error = %e, "fan-in usage violation");
        }
        outcome
    }

    /// Registers one unit and returns a guard that completes it on drop
    pub fn enlist(&self) -> Result<CompletionGuard, FanInError> {
        self.add(1)?;
        Ok(CompletionGuard {
            coordinator: self.clone(),
            completed: false,
        })
    }

    /// Blocks until the pending count reaches zero.
    /// Returns at once when nothing is pending. A waiter whose group drained
    /// is released even if a new group was added before it got to run.
    pub async fn wait(&self) {
        // An unbounded wait can only end with the count reaching zero: the
        // sender lives as long as `self`.
        let _ = self.wait_bounded(&WaitBound::unbounded()).await;
    }

    pub async fn wait_bounded(&self, bound: &WaitBound) -> Result<(), WaitError> {
        let mut group = self.group.subscribe();
        let Some(waiting) = WaiterRegistration::new(&self.group) else {
            return Ok(());
        };
        let started = waiting.generation;

        bound
            .run(async move {
                let reached_zero = group
                    .wait_for(|count| count.pending == 0 || count.generation != started)
                    .await
                    .is_ok();
                if reached_zero {
                    Ok(())
                } else {
                    Err(WaitError::Closed)
                }
            })
            .await?
    }
}

impl Default for FanInCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts a waiter against the generation it blocked on
struct WaiterRegistration<'a> {
    group: &'a watch::Sender<GroupCount>,
    generation: u64,
}

impl<'a> WaiterRegistration<'a> {
    /// `None` when nothing is pending, so there is nothing to wait for
    fn new(group: &'a watch::Sender<GroupCount>) -> Option<Self> {
        let mut generation = None;
        group.send_if_modified(|count| {
            if count.pending > 0 {
                count.waiters += 1;
                generation = Some(count.generation);
            }
            false
        });
        generation.map(|generation| Self { group, generation })
    }
}

impl Drop for WaiterRegistration<'_> {
    fn drop(&mut self) {
        // A drained generation already released its waiters
        self.group.send_if_modified(|count| {
            if count.generation == self.generation {
                count.waiters = count.waiters.saturating_sub(1);
            }
            false
        });
    }
}

/// One registered unit of work; completes it when dropped, unwinding included
pub struct CompletionGuard {
    coordinator: FanInCoordinator,
    completed: bool,
}

impl CompletionGuard {
    pub fn complete(mut self) -> Result<(), FanInError> {
        self.completed = true;
        self.coordinator.done()
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.completed {
            // Violations are already logged by `done`
            let _ = self.coordinator.done();
        }
    }
}
