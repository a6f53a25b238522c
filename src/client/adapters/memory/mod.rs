//! In-memory client storage.

mod client;

pub use client::InMemoryClientRepository;
