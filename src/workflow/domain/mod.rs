//! Domain model for workflows, micro-actions, and execution plans.

mod error;
mod ids;
mod micro_action;
mod plan;
mod workflow;

pub use error::{ParseWorkflowValueError, WorkflowDomainError};
pub use ids::{MicroActionId, WorkflowId, WorkflowName};
pub use micro_action::{ActionType, MicroAction, NewMicroAction, ParamSpec};
pub use plan::{ExecutionPlan, ResolvedStep};
pub use workflow::{
    AuthSignal, NewWorkflow, PersistedWorkflowData, Workflow, WorkflowChanges, WorkflowKind,
    WorkflowStep,
};
