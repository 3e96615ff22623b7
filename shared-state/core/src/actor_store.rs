// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::store_request::{ReadRequest, WriteRequest};
use crate::{Key, KeyValueStore, StoreError, StoreState, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Default request channel depth; one slot is the nearest thing tokio has to
/// a rendezvous channel
pub const DEFAULT_REQUEST_CAPACITY: usize = 1;

/// Store whose state is owned by a single task.
///
/// Callers never touch the state: reads and writes travel on two separate
/// request channels, each request carrying a one-shot reply that the owner
/// fulfils exactly once. When a read and a write are ready together the owner
/// picks one at random, so no ordering is promised across the two channels.
/// Within one channel requests are served in arrival order.
///
/// Handles are cheap to clone. The owner stops when `shutdown` is called or
/// the last handle is dropped.
#[derive(Clone)]
pub struct ActorStore {
    inner: Arc<StoreHandle>,
}

struct StoreHandle {
    reads: mpsc::Sender<ReadRequest>,
    writes: mpsc::Sender<WriteRequest>,
    shutdown: CancellationToken,
    owner: Mutex<Option<JoinHandle<StoreState>>>,
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl ActorStore {
    pub fn spawn() -> Self {
        Self::spawn_with_capacity(DEFAULT_REQUEST_CAPACITY)
    }

    pub fn spawn_with_capacity(capacity: usize) -> Self {
        Self::spawn_with_state(StoreState::new(), capacity)
    }

    /// Starts the owner task on the current tokio runtime
    pub fn spawn_with_state(state: StoreState, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (reads_tx, reads_rx) = mpsc::channel(capacity);
        let (writes_tx, writes_rx) = mpsc::channel(capacity);
        let shutdown = CancellationToken::new();

        let owner = StoreOwner {
            state,
            reads: reads_rx,
            writes: writes_rx,
            shutdown: shutdown.clone(),
        };
        let handle = tokio::spawn(owner.run());

        Self {
            inner: Arc::new(StoreHandle {
                reads: reads_tx,
                writes: writes_tx,
                shutdown,
                owner: Mutex::new(Some(handle)),
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Stops the owner and returns the final state.
    ///
    /// Requests already queued on either channel are answered before the
    /// owner exits; anything sent afterwards fails with `StoreError::Closed`.
    /// Only the first caller receives the state.
    pub async fn shutdown(&self) -> Result<StoreState, StoreError> {
        self.inner.shutdown.cancel();
        let handle = self.inner.owner.lock().await.take();
        match handle {
            Some(handle) => handle.await.map_err(|_| StoreError::Closed),
            None => Err(StoreError::Closed),
        }
    }

    async fn read(&self, request: ReadRequest) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        self.inner
            .reads
            .send(request)
            .await
            .map_err(|_| StoreError::Closed)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for ActorStore {
    async fn get(&self, key: Key) -> Result<Value, StoreError> {
        let (reply, response) = oneshot::channel();
        self.read(ReadRequest::Get { key, reply }).await?;
        response.await.map_err(|_| StoreError::Closed)
    }

    async fn set(&self, key: Key, value: Value) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let (reply, response) = oneshot::channel();
        self.inner
            .writes
            .send(WriteRequest { key, value, reply })
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)
    }

    async fn snapshot(&self) -> Result<StoreState, StoreError> {
        let (reply, response) = oneshot::channel();
        self.read(ReadRequest::Snapshot { reply }).await?;
        response.await.map_err(|_| StoreError::Closed)
    }
}

/// The only task that ever touches the state
struct StoreOwner {
    state: StoreState,
    reads: mpsc::Receiver<ReadRequest>,
    writes: mpsc::Receiver<WriteRequest>,
    shutdown: CancellationToken,
}

impl StoreOwner {
    async fn run(mut self) -> StoreState {
        debug!("store owner started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                Some(request) = self.reads.recv() => self.serve_read(request),
                Some(request) = self.writes.recv() => self.serve_write(request),
                else => break,
            }
        }

        // Refuse new requests, then answer whatever is already queued
        self.reads.close();
        self.writes.close();
        let mut drained = 0usize;
        while let Some(request) = self.reads.recv().await {
            self.serve_read(request);
            drained += 1;
        }
        while let Some(request) = self.writes.recv().await {
            self.serve_write(request);
            drained += 1;
        }

        debug!(drained, keys = self.state.len(), "store owner stopped");
        self.state
    }

    fn serve_read(&mut self, request: ReadRequest) {
        match request {
            ReadRequest::Get { key, reply } => {
                let value = self.state.get(&key).copied().unwrap_or_default();
                if reply.send(value).is_err() {
                    trace!(key, "reader went away before the reply");
                }
            }
            ReadRequest::Snapshot { reply } => {
                if reply.send(self.state.clone()).is_err() {
                    trace!("snapshot requester went away before the reply");
                }
            }
        }
    }

    fn serve_write(&mut self, request: WriteRequest) {
        let WriteRequest { key, value, reply } = request;
        self.state.insert(key, value);
        if reply.send(()).is_err() {
            trace!(key, "writer went away before the ack");
        }
    }
}
