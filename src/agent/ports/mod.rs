//! Port contracts for the agent runtime.

mod coordinator;
mod launcher;

pub use coordinator::{AgentCoordinator, CoordinatorResult};
pub use launcher::BrowserLauncher;
