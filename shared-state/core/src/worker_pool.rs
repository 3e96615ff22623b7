// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{FanInCoordinator, FanInError, WaitBound, WaitError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkerPoolError {
    #[error("worker pool closed")]
    Closed,

    #[error(transparent)]
    FanIn(#[from] FanInError),
}

/// Spawns tokio tasks with a fixed ceiling on how many run at once and
/// tracks their completion with a `FanInCoordinator`.
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    max_concurrency: usize,
    completion: FanInCoordinator,
}

impl WorkerPool {
    /// A ceiling of zero is raised to one
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            slots: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            completion: FanInCoordinator::new(),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Tasks currently holding a slot
    pub fn active(&self) -> usize {
        self.max_concurrency - self.slots.available_permits()
    }

    /// Units spawned and not yet finished
    pub fn pending(&self) -> usize {
        self.completion.pending()
    }

    /// Waits for a free slot, then runs `work` on its own task.
    /// The slot and the completion are released when the task ends, even
    /// when it panics.
    pub async fn spawn<F>(&self, work: F) -> Result<JoinHandle<F::Output>, WorkerPoolError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let slot = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerPoolError::Closed)?;
        let completion = self.completion.enlist()?;

        Ok(tokio::spawn(async move {
            let output = work.await;
            drop(slot);
            drop(completion);
            output
        }))
    }

    /// Blocks until every spawned unit has finished
    pub async fn join(&self) {
        self.completion.wait().await;
    }

    pub async fn join_bounded(&self, bound: &WaitBound) -> Result<(), WaitError> {
        self.completion.wait_bounded(bound).await
    }

    /// Refuses further spawns; running tasks are unaffected
    pub fn close(&self) {
        self.slots.close();
    }
}
