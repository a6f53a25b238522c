//! Client registry and heartbeat monitor for Drover.
//!
//! A client is one installation of the browser agent. It authenticates with
//! the pair `(client_id, api_token)`, reports liveness through heartbeats,
//! and is eligible to claim jobs only while its heartbeat is fresh. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
