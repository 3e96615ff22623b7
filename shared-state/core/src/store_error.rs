// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::WaitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The owner of the state has shut down (Get/Set after `shutdown`)
    #[error("store closed")]
    Closed,

    /// A bounded call gave up before the store answered
    #[error("store call did not complete: {0}")]
    Wait(#[from] WaitError),
}
