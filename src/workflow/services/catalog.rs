//! Service layer for workflow writes, listing, and plan resolution.

use crate::error::{Classify, ErrorKind};
use crate::platform::Platform;
use crate::workflow::{
    domain::{
        ActionType, ExecutionPlan, MicroAction, MicroActionId, NewMicroAction, NewWorkflow,
        ParamSpec, ResolvedStep, Workflow, WorkflowChanges, WorkflowDomainError, WorkflowId,
        WorkflowKind, WorkflowName, WorkflowStep,
    },
    ports::{
        MicroActionRepository, Page, PageRequest, WorkflowFilter, WorkflowRepository,
        WorkflowRepositoryError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for registering a micro-action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMicroActionRequest {
    name: String,
    action_type: ActionType,
    platform: Platform,
    target: Option<String>,
    params: Vec<ParamSpec>,
}

impl RegisterMicroActionRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, action_type: ActionType, platform: Platform) -> Self {
        Self {
            name: name.into(),
            action_type,
            platform,
            target: None,
            params: Vec::new(),
        }
    }

    /// Sets the target selector.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Adds a parameter declaration.
    #[must_use]
    pub fn with_param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }
}

/// Request payload for creating a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkflowRequest {
    name: String,
    platform: Platform,
    kind: WorkflowKind,
    steps: Vec<WorkflowStep>,
    requires_auth: bool,
    auth_workflow_id: Option<WorkflowId>,
}

impl CreateWorkflowRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        platform: Platform,
        kind: WorkflowKind,
        steps: Vec<WorkflowStep>,
    ) -> Self {
        Self {
            name: name.into(),
            platform,
            kind,
            steps,
            requires_auth: false,
            auth_workflow_id: None,
        }
    }

    /// Marks the workflow as requiring the given auth workflow first.
    #[must_use]
    pub const fn requiring_auth(mut self, auth_workflow_id: WorkflowId) -> Self {
        self.requires_auth = true;
        self.auth_workflow_id = Some(auth_workflow_id);
        self
    }
}

/// Request payload for a partial workflow update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateWorkflowRequest {
    /// Replacement name.
    pub name: Option<String>,
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

/// Service-level errors for workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] WorkflowRepositoryError),
    /// No workflow exists with the given identifier.
    #[error("workflow {0} not found")]
    NotFound(WorkflowId),
    /// A step references a micro-action missing from the catalog.
    #[error("step {step} references unknown micro-action {action_id}")]
    UnknownMicroAction {
        /// Zero-based step index.
        step: usize,
        /// Missing micro-action.
        action_id: MicroActionId,
    },
    /// A step's micro-action targets a different platform.
    #[error("step {step} uses a {found} micro-action in a {expected} workflow")]
    PlatformMismatch {
        /// Zero-based step index.
        step: usize,
        /// Workflow platform.
        expected: Platform,
        /// Micro-action platform.
        found: Platform,
    },
    /// The referenced auth workflow is missing or not an auth workflow.
    #[error("auth workflow {0} is missing or is not an auth workflow")]
    InvalidAuthWorkflow(WorkflowId),
    /// The workflow is deactivated and cannot be resolved for execution.
    #[error("workflow {0} is inactive")]
    Inactive(WorkflowId),
    /// No active workflow has the requested platform and name.
    #[error("no active {platform} workflow named '{name}'")]
    NoActiveWorkflow {
        /// Requested platform.
        platform: Platform,
        /// Requested name.
        name: String,
    },
}

impl Classify for WorkflowServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_)
            | Self::UnknownMicroAction { .. }
            | Self::PlatformMismatch { .. }
            | Self::InvalidAuthWorkflow(_) => ErrorKind::Validation,
            Self::Repository(WorkflowRepositoryError::DuplicateActiveName { .. }) => {
                ErrorKind::InvalidState
            }
            Self::Repository(WorkflowRepositoryError::NotFound(_))
            | Self::NotFound(_)
            | Self::NoActiveWorkflow { .. } => ErrorKind::NotFound,
            Self::Inactive(_) => ErrorKind::InvalidState,
            Self::Repository(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for workflow service operations.
pub type WorkflowServiceResult<T> = Result<T, WorkflowServiceError>;

/// Workflow administration and resolution service.
pub struct WorkflowService<W, M, C>
where
    W: WorkflowRepository + ?Sized,
    M: MicroActionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    workflows: Arc<W>,
    actions: Arc<M>,
    clock: Arc<C>,
}

impl<W, M, C> Clone for WorkflowService<W, M, C>
where
    W: WorkflowRepository + ?Sized,
    M: MicroActionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            workflows: Arc::clone(&self.workflows),
            actions: Arc::clone(&self.actions),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<W, M, C> WorkflowService<W, M, C>
where
    W: WorkflowRepository + ?Sized,
    M: MicroActionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new workflow service.
    #[must_use]
    pub const fn new(workflows: Arc<W>, actions: Arc<M>, clock: Arc<C>) -> Self {
        Self {
            workflows,
            actions,
            clock,
        }
    }

    /// Registers a micro-action in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::Domain`] when the definition is invalid
    /// or [`WorkflowServiceError::Repository`] when persistence fails.
    pub async fn register_micro_action(
        &self,
        request: RegisterMicroActionRequest,
    ) -> WorkflowServiceResult<MicroAction> {
        let RegisterMicroActionRequest {
            name,
            action_type,
            platform,
            target,
            params,
        } = request;
        let action = MicroAction::new(
            NewMicroAction {
                name,
                action_type,
                platform,
                target,
                params,
            },
            &*self.clock,
        )?;
        self.actions.store(&action).await?;
        tracing::info!(action_id = %action.id(), name = action.name(), "registered micro-action");
        Ok(action)
    }

    /// Creates a workflow after checking every step against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError`] when the shape is invalid, a step
    /// references an unknown or foreign-platform micro-action, the auth
    /// workflow reference is invalid, or persistence fails.
    pub async fn create_workflow(
        &self,
        request: CreateWorkflowRequest,
    ) -> WorkflowServiceResult<Workflow> {
        let CreateWorkflowRequest {
            name,
            platform,
            kind,
            steps,
            requires_auth,
            auth_workflow_id,
        } = request;
        let workflow = Workflow::new(
            NewWorkflow {
                name: WorkflowName::new(name)?,
                platform,
                kind,
                steps,
                requires_auth,
                auth_workflow_id,
            },
            &*self.clock,
        )?;
        self.check_references(&workflow).await?;
        self.workflows.store(&workflow).await?;
        tracing::info!(
            workflow_id = %workflow.id(),
            platform = %workflow.platform(),
            name = %workflow.name(),
            "created workflow"
        );
        Ok(workflow)
    }

    /// Applies a partial update to a workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] when the workflow does not
    /// exist, or the same validation errors as
    /// [`WorkflowService::create_workflow`].
    pub async fn update_workflow(
        &self,
        id: WorkflowId,
        request: UpdateWorkflowRequest,
    ) -> WorkflowServiceResult<Workflow> {
        let mut workflow = self.find_or_error(id).await?;
        let changes = WorkflowChanges {
            name: request.name.map(WorkflowName::new).transpose()?,
            platform: request.platform,
            kind: request.kind,
            steps: request.steps,
            requires_auth: request.requires_auth,
            auth_workflow_id: request.auth_workflow_id,
        };
        workflow.apply(changes, &*self.clock)?;
        self.check_references(&workflow).await?;
        self.workflows.update(&workflow).await?;
        tracing::info!(workflow_id = %id, "updated workflow");
        Ok(workflow)
    }

    /// Deactivates a workflow. Jobs that already reference it keep working
    /// history; new jobs are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] when the workflow does not
    /// exist or [`WorkflowServiceError::Repository`] when persistence fails.
    pub async fn deactivate(&self, id: WorkflowId) -> WorkflowServiceResult<Workflow> {
        let mut workflow = self.find_or_error(id).await?;
        workflow.deactivate(&*self.clock);
        self.workflows.update(&workflow).await?;
        tracing::info!(workflow_id = %id, "deactivated workflow");
        Ok(workflow)
    }

    /// Finds a workflow by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::Repository`] when lookup fails.
    pub async fn find(&self, id: WorkflowId) -> WorkflowServiceResult<Option<Workflow>> {
        Ok(self.workflows.find_by_id(id).await?)
    }

    /// Resolves an active workflow into an execution plan.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] when the workflow does not
    /// exist, [`WorkflowServiceError::Inactive`] when it has been deactivated,
    /// or [`WorkflowServiceError::UnknownMicroAction`] when the catalog no
    /// longer holds a referenced action.
    pub async fn resolve(&self, id: WorkflowId) -> WorkflowServiceResult<ExecutionPlan> {
        let workflow = self.find_or_error(id).await?;
        if !workflow.is_active() {
            return Err(WorkflowServiceError::Inactive(id));
        }
        self.enrich(&workflow).await
    }

    /// Resolves the active workflow with the given platform and name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NoActiveWorkflow`] when none matches.
    pub async fn resolve_by_name(
        &self,
        platform: Platform,
        name: &str,
    ) -> WorkflowServiceResult<ExecutionPlan> {
        let workflow_name = WorkflowName::new(name)?;
        let workflow = self
            .workflows
            .find_active_by_name(platform, &workflow_name)
            .await?
            .ok_or_else(|| WorkflowServiceError::NoActiveWorkflow {
                platform,
                name: workflow_name.to_string(),
            })?;
        self.enrich(&workflow).await
    }

    /// Returns the active auth workflow for a platform.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NoActiveWorkflow`] when the platform
    /// has no active auth workflow.
    pub async fn auth_workflow(&self, platform: Platform) -> WorkflowServiceResult<Workflow> {
        self.workflows
            .find_active_auth(platform)
            .await?
            .ok_or_else(|| WorkflowServiceError::NoActiveWorkflow {
                platform,
                name: WorkflowKind::Auth.as_str().to_owned(),
            })
    }

    /// Lists workflows with their steps enriched by micro-action details.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError`] when lookup or enrichment fails.
    pub async fn list(
        &self,
        filter: WorkflowFilter,
        page: PageRequest,
    ) -> WorkflowServiceResult<Page<ExecutionPlan>> {
        let workflows = self.workflows.list(filter, page).await?;
        let mut plans = Vec::with_capacity(workflows.items.len());
        for workflow in &workflows.items {
            plans.push(self.enrich(workflow).await?);
        }
        Ok(Page {
            items: plans,
            total: workflows.total,
            request: workflows.request,
        })
    }

    async fn find_or_error(&self, id: WorkflowId) -> WorkflowServiceResult<Workflow> {
        self.workflows
            .find_by_id(id)
            .await?
            .ok_or(WorkflowServiceError::NotFound(id))
    }

    async fn check_references(&self, workflow: &Workflow) -> WorkflowServiceResult<()> {
        self.enrich(workflow).await?;
        if let Some(auth_id) = workflow.auth_workflow_id() {
            let auth = self.workflows.find_by_id(auth_id).await?;
            let is_valid = auth.is_some_and(|auth| {
                auth.kind() == WorkflowKind::Auth && auth.platform() == workflow.platform()
            });
            if !is_valid || auth_id == workflow.id() {
                return Err(WorkflowServiceError::InvalidAuthWorkflow(auth_id));
            }
        }
        Ok(())
    }

    /// Inlines micro-action details into a workflow's steps, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::UnknownMicroAction`] or
    /// [`WorkflowServiceError::PlatformMismatch`] when a step no longer
    /// resolves.
    pub async fn enrich(&self, workflow: &Workflow) -> WorkflowServiceResult<ExecutionPlan> {
        let mut steps = Vec::with_capacity(workflow.steps().len());
        for (index, step) in workflow.steps().iter().enumerate() {
            let action = self
                .actions
                .find_by_id(step.action_id)
                .await?
                .ok_or(WorkflowServiceError::UnknownMicroAction {
                    step: index,
                    action_id: step.action_id,
                })?;
            if action.platform() != workflow.platform() {
                return Err(WorkflowServiceError::PlatformMismatch {
                    step: index,
                    expected: workflow.platform(),
                    found: action.platform(),
                });
            }
            steps.push(ResolvedStep {
                index,
                action,
                params: step.params.clone(),
                auth_signal: step.auth_signal,
            });
        }
        Ok(ExecutionPlan {
            workflow_id: workflow.id(),
            name: workflow.name().clone(),
            platform: workflow.platform(),
            kind: workflow.kind(),
            requires_auth: workflow.requires_auth(),
            auth_workflow_id: workflow.auth_workflow_id(),
            is_active: workflow.is_active(),
            steps,
        })
    }
}
