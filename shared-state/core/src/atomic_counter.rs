// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free monotonic counter.
///
/// Every increment is visible to any later `load` from any task; concurrent
/// increments are never lost.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Adds one and returns the new value
    pub fn increment(&self) -> u64 {
        self.add(1)
    }

    /// Adds `n` and returns the new value
    pub fn add(&self, n: u64) -> u64 {
        self.value.fetch_add(n, Ordering::SeqCst) + n
    }

    pub fn load(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

/// Read/write operation totals shared by every worker of a workload
#[derive(Debug, Default)]
pub struct OpCounters {
    reads: AtomicCounter,
    writes: AtomicCounter,
}

impl OpCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&self) -> u64 {
        self.reads.increment()
    }

    pub fn record_write(&self) -> u64 {
        self.writes.increment()
    }

    pub fn reads(&self) -> u64 {
        self.reads.load()
    }

    pub fn writes(&self) -> u64 {
        self.writes.load()
    }

    pub fn snapshot(&self) -> OpCountsSnapshot {
        OpCountsSnapshot {
            reads: self.reads(),
            writes: self.writes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpCountsSnapshot {
    pub reads: u64,
    pub writes: u64,
}

impl OpCountsSnapshot {
    pub fn total(&self) -> u64 {
        self.reads + self.writes
    }
}
