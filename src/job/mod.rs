//! Job queue for Drover.
//!
//! Jobs are units of work an owner asks a specific client to perform. The
//! queue hands each job to exactly one claimant, retries transient failures
//! up to a budget, and fails jobs that outlive their expiry. The module
//! follows hexagonal architecture:
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
