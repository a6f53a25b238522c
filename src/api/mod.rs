//! Boundary facade for Drover.
//!
//! [`DroverApi`] is what an HTTP layer would call: it authenticates the
//! caller, invokes the owning service, and converts results into camelCase
//! views and failures into an [`ApiError`] carrying a status code and a
//! message that never includes selectors or platform markup. The facade
//! also serves agents in-process through the
//! [`crate::agent::ports::AgentCoordinator`] port.

mod coordinator;
mod dto;
mod error;
mod facade;
mod session;

pub use dto::{
    AccountView, ClientView, CreateMicroActionBody, CreateWorkflowBody, EncryptionKeyView,
    EnqueueJobBody, HeartbeatBody, HeartbeatView, InstallClientBody, InstalledClientView,
    JobView, LinkAccountBody, MicroActionView, PageView, ParamSpecBody, StepView,
    UpdateWorkflowBody, VerifyAccountBody, WorkflowQuery, WorkflowStepBody, WorkflowView,
};
pub use error::{ApiError, ApiResult};
pub use facade::{DroverApi, DroverRepositories};
pub use session::UserSession;

#[cfg(test)]
pub(crate) mod tests;
