//! Adapter implementations for client storage.

pub mod memory;
