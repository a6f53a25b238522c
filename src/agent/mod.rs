//! Agent runtime for Drover clients.
//!
//! An agent runs on a client device. It claims jobs addressed to that
//! client, resolves the job's workflow into concrete browser commands,
//! validates them before any page is opened, and drives a fresh page through
//! the human-behaviour layer. Each platform exposes a capability set; the
//! friendly calls (`post`, `react`, and so on) are thin mappers onto
//! [`services::AgentRuntime::run_workflow`].
//!
//! - Capabilities, commands, and failures in [`domain`]
//! - Coordinator and browser launcher seams in [`ports`]
//! - A simulated launcher in [`adapters`]
//! - The runtime and per-account sessions in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
