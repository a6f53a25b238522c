//! Job execution services.

mod runtime;
mod session;

pub use runtime::AgentRuntime;
pub use session::AgentSession;
