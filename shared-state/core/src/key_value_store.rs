// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{StoreError, WaitBound};
use std::collections::HashMap;

pub type Key = u32;
pub type Value = i64;

/// Key to value mapping owned by exactly one party at any instant
pub type StoreState = HashMap<Key, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read { key: Key },
    Write { key: Key, value: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    Read(Value),
    Written,
}

/// Trait for abstracting the keyed integer store
/// Different implementations handle concurrency internally
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    /// Absent keys read as zero; absence is not an error
    async fn get(&self, key: Key) -> Result<Value, StoreError>;

    /// Overwrite the value stored under `key`
    /// Once this returns, later gets observe `value` until another set replaces it
    async fn set(&self, key: Key, value: Value) -> Result<(), StoreError>;

    /// Copy of the whole state at a single point of the store's total order
    async fn snapshot(&self) -> Result<StoreState, StoreError>;

    async fn apply(&self, operation: Operation) -> Result<OperationOutcome, StoreError> {
        match operation {
            Operation::Read { key } => self.get(key).await.map(OperationOutcome::Read),
            Operation::Write { key, value } => {
                self.set(key, value).await.map(|_| OperationOutcome::Written)
            }
        }
    }

    async fn get_bounded(&self, key: Key, bound: &WaitBound) -> Result<Value, StoreError> {
        bound.run(self.get(key)).await?
    }

    async fn set_bounded(
        &self,
        key: Key,
        value: Value,
        bound: &WaitBound,
    ) -> Result<(), StoreError> {
        bound.run(self.set(key, value)).await?
    }
}
