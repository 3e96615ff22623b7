// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Key, Value};

/// Source of the keys and values a workload operates on
pub trait Random: Send + Sync {
    /// Key drawn uniformly from `0..key_space`
    fn key(&self, key_space: Key) -> Key;

    /// Value drawn uniformly from `0..max_value`
    fn value(&self, max_value: Value) -> Value;
}
