//! In-memory workflow and micro-action repositories.

mod micro_action;
mod workflow;

pub use micro_action::InMemoryMicroActionRepository;
pub use workflow::InMemoryWorkflowRepository;
