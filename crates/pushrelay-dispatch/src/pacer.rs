//! Inter-batch pacing seam.
//!
//! The batch splitter pauses between windows to smooth the request rate to
//! the provider. The pause is behind a trait so tests run without
//! wall-clock waits.

use async_trait::async_trait;
use std::time::Duration;

/// Pause between consecutive batch windows.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Real pacer backed by `tokio::time::sleep`.
pub struct TokioPacer {
    interval: Duration,
}

impl TokioPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for TokioPacer {
    fn default() -> Self {
        Self::new(crate::batch::BATCH_PAUSE)
    }
}

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self) {
        tokio::time::sleep(self.interval).await;
    }
}
