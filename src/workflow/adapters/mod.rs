//! Adapter implementations for workflow storage.

pub mod memory;
