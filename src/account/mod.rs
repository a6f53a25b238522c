//! Linked social-platform accounts for Drover.
//!
//! An account is a user's login on one platform. Its secret is stored only
//! as ciphertext under a client key, and its status is driven by the
//! outcome of auth workflow runs. The module follows hexagonal architecture:
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
