//! Drover: remote browser-agent coordination.
//!
//! Users queue social-media jobs against accounts linked to their own
//! installed agents. Agents heartbeat, claim jobs atomically, resolve the
//! job's workflow into concrete browser steps, and drive a browser through
//! a human-like behaviour layer before reporting the outcome.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and browsers
//! - **Adapters**: Concrete implementations of ports
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`job`]: Job queue with atomic claiming, retries, and expiry
//! - [`client`]: Client registry, api tokens, and heartbeats
//! - [`credential`]: Installation key custody and secret encryption
//! - [`account`]: Linked platform accounts and their verification state
//! - [`workflow`]: Micro-action catalog and workflow resolution
//! - [`behavior`]: Human-like timing, typing, mouse movement, and stealth
//! - [`agent`]: Agent runtime and per-platform adapters
//! - [`api`]: Boundary facade for users, admins, and agents
//! - [`worker`]: Heartbeat, claim, and expiry loops

pub mod account;
pub mod agent;
pub mod api;
pub mod behavior;
pub mod client;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod job;
pub mod owner;
pub mod platform;
pub mod telemetry;
pub mod worker;
pub mod workflow;
