//! Wall-clock pacer.

use crate::behavior::ports::Pacer;
use async_trait::async_trait;
use std::time::Duration;

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
