//! Launcher implementations.

mod simulated;

pub use simulated::SimulatedLauncher;
