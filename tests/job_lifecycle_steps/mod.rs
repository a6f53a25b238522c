//! Step definitions for job lifecycle scenarios.

#[path = "../agent_flow/helpers.rs"]
pub mod helpers;

pub mod given;
pub mod then;
pub mod when;
pub mod world;
