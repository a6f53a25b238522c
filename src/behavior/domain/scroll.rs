//! Incremental scrolling.

use super::random_delay;
use rand::Rng;
use std::time::Duration;

/// One wheel increment followed by a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollStep {
    /// Vertical distance in pixels; negative scrolls up.
    pub delta: i64,
    /// Pause after the increment.
    pub pause: Duration,
}

/// Splits a scroll of `distance` pixels into 5–9 increments.
///
/// The increments sum to `distance`; the remainder of the even split goes
/// to the last one.
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "the remainder is carried into the final increment"
)]
pub fn plan_scroll<R: Rng + ?Sized>(
    rng: &mut R,
    distance: i64,
    pause_min_ms: u64,
    pause_max_ms: u64,
) -> Vec<ScrollStep> {
    let steps: i64 = rng.gen_range(5..=9);
    let base = distance / steps;
    let remainder = distance % steps;
    (1..=steps)
        .map(|i| ScrollStep {
            delta: if i == steps { base + remainder } else { base },
            pause: random_delay(rng, pause_min_ms, pause_max_ms),
        })
        .collect()
}
