// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::time::Duration;
use tokio::time::Instant;

/// Clock seen by a workload: the pause between operations and the instants
/// its run time is measured from
#[async_trait::async_trait]
pub trait Timer: Send + Sync {
    async fn sleep(&self, duration: Duration);

    fn now(&self) -> Instant {
        Instant::now()
    }
}
