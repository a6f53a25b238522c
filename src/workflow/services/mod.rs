//! Application services for workflow administration and resolution.

mod catalog;

pub use catalog::{
    CreateWorkflowRequest, RegisterMicroActionRequest, UpdateWorkflowRequest, WorkflowService,
    WorkflowServiceError, WorkflowServiceResult,
};
