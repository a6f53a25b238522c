//! Sleep port.

use async_trait::async_trait;
use std::time::Duration;

/// Suspends the caller between humanized actions.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits for `duration`.
    async fn pause(&self, duration: Duration);
}
