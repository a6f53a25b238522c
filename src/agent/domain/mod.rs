//! Domain model for the agent runtime.

mod command;
mod error;
mod identity;
mod platform_agent;
mod report;

pub use command::{PreparedStep, StepCommand};
pub use error::{AgentError, AgentResult, CoordinatorError, StepFailureReason};
pub use identity::{AgentIdentity, ClientCredentials};
pub use platform_agent::PlatformAgent;
pub use report::RunReport;
