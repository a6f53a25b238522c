//! Workflow definitions and step resolution for Drover.
//!
//! Workflows are admin-defined, ordered sequences of steps for one platform.
//! Each step references a reusable micro-action from a global catalog.
//! Resolving a workflow inlines every micro-action definition and yields an
//! execution plan that an agent can run without further lookups. The module
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
