// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Key, StoreState, Value};
use tokio::sync::oneshot;

/// Request carried on the owner's read channel
#[derive(Debug)]
pub enum ReadRequest {
    Get {
        key: Key,
        reply: oneshot::Sender<Value>,
    },
    Snapshot {
        reply: oneshot::Sender<StoreState>,
    },
}

/// Request carried on the owner's write channel
#[derive(Debug)]
pub struct WriteRequest {
    pub key: Key,
    pub value: Value,
    pub reply: oneshot::Sender<()>,
}
