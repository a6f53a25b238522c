//! Anti-detection and human-behaviour layer for Drover agents.
//!
//! Every page interaction an agent performs goes through
//! [`services::HumanPage`], which masks automation fingerprints before the
//! first navigation and paces clicks, typing, and scrolling with randomized,
//! human-like timing. The sampling functions in [`domain`] are pure over an
//! injected [`rand::Rng`], so tests drive them with seeded generators.
//!
//! - Timing, typing, pointer, scroll, and fingerprint models in [`domain`]
//! - The browser driver and sleep seams in [`ports`]
//! - Pacer implementations in [`adapters`]
//! - The humanized page wrapper in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
