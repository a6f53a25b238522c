//! Pointer movement along quadratic Bézier curves.

use super::random_delay;
use rand::Rng;
use std::time::Duration;

/// Maximum sideways offset of the curve's control point, in pixels.
const CONTROL_JITTER_PX: f64 = 120.0;

/// A viewport coordinate in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One pointer move followed by a pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseStep {
    /// Position to move to.
    pub to: Point,
    /// Pause after the move.
    pub pause: Duration,
}

/// Plans a pointer path from `from` to `to`.
///
/// The path follows a quadratic Bézier curve whose control point is the
/// midpoint displaced by a random offset. It has 20–30 steps, each followed
/// by a 10–20 ms pause, and its last step lands exactly on `to`.
#[expect(
    clippy::float_arithmetic,
    reason = "Bézier interpolation is defined over reals"
)]
pub fn bezier_path<R: Rng + ?Sized>(rng: &mut R, from: Point, to: Point) -> Vec<MouseStep> {
    let steps: u32 = rng.gen_range(20..=30);
    let control = Point::new(
        (from.x + to.x) / 2.0 + rng.gen_range(-CONTROL_JITTER_PX..=CONTROL_JITTER_PX),
        (from.y + to.y) / 2.0 + rng.gen_range(-CONTROL_JITTER_PX..=CONTROL_JITTER_PX),
    );
    (1..=steps)
        .map(|i| {
            let t = f64::from(i) / f64::from(steps);
            let u = 1.0 - t;
            let point = Point::new(
                u * u * from.x + 2.0 * u * t * control.x + t * t * to.x,
                u * u * from.y + 2.0 * u * t * control.y + t * t * to.y,
            );
            MouseStep {
                to: if i == steps { to } else { point },
                pause: random_delay(rng, 10, 20),
            }
        })
        .collect()
}
