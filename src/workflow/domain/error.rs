//! Error types for workflow domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or resolving workflow values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// The workflow name is empty after trimming.
    #[error("workflow name must not be empty")]
    EmptyWorkflowName,

    /// The workflow name contains characters outside `[a-z0-9_]`.
    #[error(
        "workflow name '{0}' contains invalid characters (only lowercase alphanumeric and underscores allowed)"
    )]
    InvalidWorkflowName(String),

    /// A workflow must contain at least one step.
    #[error("workflow must contain at least one step")]
    EmptySteps,

    /// An auth workflow cannot itself depend on another auth workflow.
    #[error("auth workflows cannot require authentication")]
    AuthWorkflowRequiresAuth,

    /// The micro-action name is empty after trimming.
    #[error("micro-action name must not be empty")]
    EmptyActionName,

    /// The micro-action type interacts with an element but has no target.
    #[error("micro-action '{0}' requires a target selector")]
    MissingTarget(String),

    /// A parameter name is declared more than once.
    #[error("parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    /// A required step parameter has no value and no default.
    #[error("step {step} is missing required parameter '{name}'")]
    MissingParameter {
        /// Zero-based step index.
        step: usize,
        /// Parameter name.
        name: String,
    },

    /// A step parameter template failed to render.
    #[error("step {step} parameter '{name}' failed to render: {message}")]
    Template {
        /// Zero-based step index.
        step: usize,
        /// Parameter name.
        name: String,
        /// Renderer message.
        message: String,
    },
}

/// Error returned while parsing workflow enums from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {field} value: {value}")]
pub struct ParseWorkflowValueError {
    /// Field that failed to parse.
    pub field: &'static str,
    /// Raw value.
    pub value: String,
}
