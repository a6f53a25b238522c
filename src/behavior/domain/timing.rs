//! Delay sampling.

use rand::Rng;
use std::time::Duration;

/// Draws one standard normal variate with the Box–Muller transform.
#[expect(
    clippy::float_arithmetic,
    reason = "the Box-Muller transform is defined over reals"
)]
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Shift to (0, 1] so the logarithm is finite.
    let u1 = 1.0 - rng.r#gen::<f64>();
    let u2 = rng.r#gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Samples a delay from a normal distribution over `[min_ms, max_ms]`.
///
/// The mean is the midpoint of the range and the standard deviation is a
/// sixth of its width; samples outside the range are clamped to it. Bounds
/// given in reverse order are swapped.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "millisecond bounds fit losslessly in f64 and the clamped sample is non-negative"
)]
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R, min_ms: u64, max_ms: u64) -> Duration {
    let (lo, hi) = ordered(min_ms, max_ms);
    if lo == hi {
        return Duration::from_millis(lo);
    }
    let (lo_f, hi_f) = (lo as f64, hi as f64);
    let mean = (lo_f + hi_f) / 2.0;
    let sd = (hi_f - lo_f) / 6.0;
    let sample = (mean + standard_normal(rng) * sd).clamp(lo_f, hi_f).round();
    Duration::from_millis(sample as u64)
}

const fn ordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b { (a, b) } else { (b, a) }
}
