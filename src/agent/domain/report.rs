//! Successful run summary.

use crate::workflow::domain::{WorkflowId, WorkflowName};
use serde_json::{Value, json};

/// Summary of a completed run, stored as the job result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Workflow that ran.
    pub workflow_id: WorkflowId,
    /// Its canonical name.
    pub workflow: WorkflowName,
    /// Steps executed, including any login steps run first.
    pub steps_completed: usize,
}

impl RunReport {
    /// Renders the report as a job result.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "workflowId": self.workflow_id.to_string(),
            "workflow": self.workflow.as_str(),
            "stepsCompleted": self.steps_completed,
        })
    }
}
