//! Adapter implementations for job storage.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
