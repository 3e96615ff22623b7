// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Key, KeyValueStore, StoreError, StoreState, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::trace;

/// Store whose state lives behind a single exclusive critical section.
///
/// Overlapping calls are ordered by the order in which they acquire the lock.
/// The guard is released when it goes out of scope, so no path (an unwinding
/// one included) can leave the lock held.
#[derive(Clone, Default)]
pub struct GuardedStore {
    state: Arc<Mutex<StoreState>>,
}

impl GuardedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for GuardedStore {
    async fn get(&self, key: Key) -> Result<Value, StoreError> {
        let state = self.state.lock().await;
        let value = state.get(&key).copied().unwrap_or_default();
        trace!(key, value, "guarded get");
        Ok(value)
    }

    async fn set(&self, key: Key, value: Value) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.insert(key, value);
        trace!(key, value, "guarded set");
        Ok(())
    }

    async fn snapshot(&self) -> Result<StoreState, StoreError> {
        let state = self.state.lock().await;
        Ok(state.clone())
    }
}
