//! Pacer that records pauses instead of sleeping.

use crate::behavior::ports::Pacer;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Records every requested pause and returns immediately.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPacer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pauses requested so far, in order.
    #[must_use]
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the sum of all requested pauses.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.pauses().iter().sum()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}
