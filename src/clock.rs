//! Manually driven clock for deterministic scheduling and expiry.

use chrono::{DateTime, Duration, Local, Utc};
use mockable::Clock;
use std::sync::{Arc, PoisonError, RwLock};

/// Clock whose time only moves when told to.
///
/// Heartbeat staleness, token expiry, and job expiry all depend on the current
/// time; this clock lets sandboxes and tests step through those boundaries
/// without sleeping. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock fixed at the given instant.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    /// Creates a clock fixed at the current wall-clock time.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::at(Utc::now())
    }

    /// Moves the clock forward (or backward for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now = instant;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}
