//! Adapter implementations for account storage.

pub mod memory;
