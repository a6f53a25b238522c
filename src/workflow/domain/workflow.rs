//! Workflow aggregate root and step definitions.

use super::{MicroActionId, ParseWorkflowValueError, WorkflowDomainError, WorkflowId, WorkflowName};
use crate::platform::Platform;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whether a workflow logs in or performs an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    /// Logs an account in and confirms the session.
    Auth,
    /// Performs a platform action such as posting or following.
    Action,
}

impl WorkflowKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Action => "action",
        }
    }
}

impl TryFrom<&str> for WorkflowKind {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "action" => Ok(Self::Action),
            _ => Err(ParseWorkflowValueError {
                field: "workflow type",
                value: value.to_owned(),
            }),
        }
    }
}

/// Meaning attached to a step failure during authentication.
///
/// A login form that stays on screen after submit means the platform rejected
/// the credentials; a challenge page means it wants the user to re-verify.
/// Steps that detect these conditions carry the signal so the runtime never
/// has to inspect page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSignal {
    /// Failure of this step means the credentials were rejected.
    CredentialsRejected,
    /// Failure of this step means the platform forces re-verification.
    ReauthRequired,
}

/// One ordered step of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Referenced micro-action.
    pub action_id: MicroActionId,
    /// Step parameters; string values are templates over job parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Meaning of this step failing, if any.
    #[serde(default)]
    pub auth_signal: Option<AuthSignal>,
}

impl WorkflowStep {
    /// Creates a step without parameters.
    #[must_use]
    pub fn new(action_id: MicroActionId) -> Self {
        Self {
            action_id,
            params: Map::new(),
            auth_signal: None,
        }
    }

    /// Sets a step parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Attaches an authentication signal to the step.
    #[must_use]
    pub const fn with_auth_signal(mut self, signal: AuthSignal) -> Self {
        self.auth_signal = Some(signal);
        self
    }
}

/// Parameter object for creating a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkflow {
    /// Canonical workflow name.
    pub name: WorkflowName,
    /// Platform the workflow runs on.
    pub platform: Platform,
    /// Auth or action.
    pub kind: WorkflowKind,
    /// Ordered steps.
    pub steps: Vec<WorkflowStep>,
    /// Whether the account must be logged in first.
    pub requires_auth: bool,
    /// Workflow used to log in when `requires_auth` is set.
    pub auth_workflow_id: Option<WorkflowId>,
}

/// Partial update applied to an existing workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowChanges {
    /// Replacement name.
    pub name: Option<WorkflowName>,
    /// Replacement platform.
    pub platform: Option<Platform>,
    /// Replacement kind.
    pub kind: Option<WorkflowKind>,
    /// Replacement step list.
    pub steps: Option<Vec<WorkflowStep>>,
    /// Replacement auth requirement.
    pub requires_auth: Option<bool>,
    /// Replacement auth workflow; `Some(None)` clears it.
    pub auth_workflow_id: Option<Option<WorkflowId>>,
}

/// Workflow aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,
    name: WorkflowName,
    platform: Platform,
    kind: WorkflowKind,
    steps: Vec<WorkflowStep>,
    requires_auth: bool,
    auth_workflow_id: Option<WorkflowId>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkflowData {
    /// Persisted identifier.
    pub id: WorkflowId,
    /// Persisted name.
    pub name: WorkflowName,
    /// Persisted platform.
    pub platform: Platform,
    /// Persisted kind.
    pub kind: WorkflowKind,
    /// Persisted steps.
    pub steps: Vec<WorkflowStep>,
    /// Persisted auth requirement.
    pub requires_auth: bool,
    /// Persisted auth workflow reference.
    pub auth_workflow_id: Option<WorkflowId>,
    /// Persisted activity flag.
    pub is_active: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates a new active workflow.
    ///
    /// Micro-action existence is checked by the service layer; this
    /// constructor enforces shape invariants only.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptySteps`] when no steps are given or
    /// [`WorkflowDomainError::AuthWorkflowRequiresAuth`] when an auth workflow
    /// declares an auth dependency.
    pub fn new(data: NewWorkflow, clock: &impl Clock) -> Result<Self, WorkflowDomainError> {
        validate_shape(data.kind, &data.steps, data.requires_auth)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: WorkflowId::new(),
            name: data.name,
            platform: data.platform,
            kind: data.kind,
            steps: data.steps,
            requires_auth: data.requires_auth,
            auth_workflow_id: data.auth_workflow_id,
            is_active: true,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a workflow from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkflowData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            platform: data.platform,
            kind: data.kind,
            steps: data.steps,
            requires_auth: data.requires_auth,
            auth_workflow_id: data.auth_workflow_id,
            is_active: data.is_active,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub const fn id(&self) -> WorkflowId {
        self.id
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn name(&self) -> &WorkflowName {
        &self.name
    }

    /// Returns the platform.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the workflow kind.
    #[must_use]
    pub const fn kind(&self) -> WorkflowKind {
        self.kind
    }

    /// Returns the ordered steps.
    #[must_use]
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    /// Returns whether the account must be logged in first.
    #[must_use]
    pub const fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Returns the auth workflow reference, if any.
    #[must_use]
    pub const fn auth_workflow_id(&self) -> Option<WorkflowId> {
        self.auth_workflow_id
    }

    /// Returns whether the workflow may be used for new jobs.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial update.
    ///
    /// The update is validated as a whole before any field changes, so a
    /// rejected update leaves the workflow untouched.
    ///
    /// # Errors
    ///
    /// Returns the same shape errors as [`Workflow::new`].
    pub fn apply(
        &mut self,
        changes: WorkflowChanges,
        clock: &impl Clock,
    ) -> Result<(), WorkflowDomainError> {
        let kind = changes.kind.unwrap_or(self.kind);
        let requires_auth = changes.requires_auth.unwrap_or(self.requires_auth);
        let steps = changes.steps.as_deref().unwrap_or(&self.steps);
        validate_shape(kind, steps, requires_auth)?;

        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(platform) = changes.platform {
            self.platform = platform;
        }
        if let Some(steps) = changes.steps {
            self.steps = steps;
        }
        if let Some(auth_workflow_id) = changes.auth_workflow_id {
            self.auth_workflow_id = auth_workflow_id;
        }
        self.kind = kind;
        self.requires_auth = requires_auth;
        self.touch(clock);
        Ok(())
    }

    /// Marks the workflow inactive. Workflows are never physically deleted
    /// because historical jobs reference them.
    pub fn deactivate(&mut self, clock: &impl Clock) {
        self.is_active = false;
        self.touch(clock);
    }

    /// Marks the workflow active again.
    pub fn activate(&mut self, clock: &impl Clock) {
        self.is_active = true;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn validate_shape(
    kind: WorkflowKind,
    steps: &[WorkflowStep],
    requires_auth: bool,
) -> Result<(), WorkflowDomainError> {
    if steps.is_empty() {
        return Err(WorkflowDomainError::EmptySteps);
    }
    if kind == WorkflowKind::Auth && requires_auth {
        return Err(WorkflowDomainError::AuthWorkflowRequiresAuth);
    }
    Ok(())
}
