//! Run failures and their classification.

use crate::account::domain::AuthOutcome;
use crate::behavior::ports::PageError;
use crate::credential::domain::CredentialError;
use crate::error::{Classify, ErrorKind};
use crate::job::domain::{JobFailure, JobType};
use crate::platform::Platform;
use crate::workflow::domain::{AuthSignal, WorkflowDomainError};
use std::fmt;
use thiserror::Error;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Page failure with its selectors and URLs removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFailureReason {
    /// An element did not appear in time.
    Timeout,
    /// An element was not on the page.
    TargetMissing,
    /// The page was not where the step expected.
    UnexpectedNavigation,
    /// The browser driver failed.
    Driver,
}

impl From<&PageError> for StepFailureReason {
    fn from(err: &PageError) -> Self {
        match err {
            PageError::Timeout { .. } => Self::Timeout,
            PageError::TargetMissing { .. } => Self::TargetMissing,
            PageError::UnexpectedNavigation { .. } => Self::UnexpectedNavigation,
            PageError::Driver(_) => Self::Driver,
        }
    }
}

impl fmt::Display for StepFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "page element did not appear in time",
            Self::TargetMissing => "page element not found",
            Self::UnexpectedNavigation => "page navigated somewhere unexpected",
            Self::Driver => "browser driver error",
        })
    }
}

/// Failure reported by a coordinator call, already classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoordinatorError {
    kind: ErrorKind,
    message: String,
}

impl CoordinatorError {
    /// Creates a classified coordinator error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Captures the kind and message of a service error.
    pub fn from_classified<E: Classify + fmt::Display>(err: &E) -> Self {
        Self::new(err.kind(), err.to_string())
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Classify for CoordinatorError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Why a run did not complete.
///
/// Display text never contains selectors, URLs, or page content, so it can
/// be stored on the job and shown to users.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The platform has no such capability.
    #[error("{platform} does not support {capability} jobs")]
    Unsupported {
        /// Platform of the workflow.
        platform: Platform,
        /// Requested capability.
        capability: JobType,
    },

    /// A required job parameter is absent or blank.
    #[error("missing required parameter '{0}'")]
    MissingParam(String),

    /// Text exceeds the platform limit.
    #[error("text is {length} characters but {platform} allows at most {max}")]
    TextTooLong {
        /// Platform of the workflow.
        platform: Platform,
        /// Characters supplied.
        length: usize,
        /// Platform limit.
        max: usize,
    },

    /// A step's parameters could not be rendered.
    #[error(transparent)]
    Render(#[from] WorkflowDomainError),

    /// A step lacks a value its action needs.
    #[error("step {index} ({action}) has no usable '{name}' parameter")]
    StepParam {
        /// Zero-based step index.
        index: usize,
        /// Micro-action name.
        action: String,
        /// Missing parameter.
        name: &'static str,
    },

    /// The account belongs to another platform than the workflow.
    #[error("account is on {account} but the workflow targets {workflow}")]
    PlatformMismatch {
        /// Account platform.
        account: Platform,
        /// Workflow platform.
        workflow: Platform,
    },

    /// A step failed against the live page. The run stops here.
    #[error("step {index} ({action}) failed: {reason}")]
    Step {
        /// Zero-based step index.
        index: usize,
        /// Micro-action name.
        action: String,
        /// Sanitized cause.
        reason: StepFailureReason,
        /// Meaning of the failure for the account, if the step declares one.
        auth_signal: Option<AuthSignal>,
    },

    /// No page could be opened or prepared.
    #[error("browser session could not be prepared: {reason}")]
    Session {
        /// Sanitized cause.
        reason: StepFailureReason,
    },

    /// The account secret could not be decrypted.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// A coordinator call failed.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl AgentError {
    /// Wraps a page failure that happened before the first step.
    #[must_use]
    pub fn session(err: &PageError) -> Self {
        Self::Session {
            reason: StepFailureReason::from(err),
        }
    }

    /// Returns the account transition this failure implies, if any.
    #[must_use]
    pub const fn auth_outcome(&self) -> Option<AuthOutcome> {
        match self {
            Self::Step {
                auth_signal: Some(AuthSignal::CredentialsRejected),
                ..
            } => Some(AuthOutcome::CredentialsRejected),
            Self::Step {
                auth_signal: Some(AuthSignal::ReauthRequired),
                ..
            } => Some(AuthOutcome::ReauthRequired),
            _ => None,
        }
    }

    /// Converts the error into the failure recorded on a job.
    #[must_use]
    pub fn to_failure(&self) -> JobFailure {
        JobFailure::new(self.kind(), self.to_string())
    }
}

impl Classify for AgentError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Unsupported { .. }
            | Self::MissingParam(_)
            | Self::TextTooLong { .. }
            | Self::Render(_)
            | Self::StepParam { .. }
            | Self::PlatformMismatch { .. } => ErrorKind::Validation,
            Self::Step {
                auth_signal: Some(_),
                ..
            } => ErrorKind::Unauthorized,
            Self::Step { .. } => ErrorKind::UpstreamPlatform,
            Self::Session { .. } | Self::Credential(_) => ErrorKind::Internal,
            Self::Coordinator(err) => err.kind(),
        }
    }
}
