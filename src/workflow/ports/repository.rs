//! Repository ports for workflow definitions and the micro-action catalog.

use crate::platform::Platform;
use crate::workflow::domain::{
    MicroAction, MicroActionId, Workflow, WorkflowId, WorkflowKind, WorkflowName,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow repository operations.
pub type WorkflowRepositoryResult<T> = Result<T, WorkflowRepositoryError>;

/// Largest page size served by listings.
const MAX_PAGE_SIZE: usize = 100;

/// Offset/limit pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: usize,
    limit: usize,
}

impl PageRequest {
    /// Creates a page request, clamping the limit to `1..=100`.
    #[must_use]
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Creates a request for a one-based page number.
    #[must_use]
    pub fn page(page: usize, per_page: usize) -> Self {
        let limit = per_page.clamp(1, MAX_PAGE_SIZE);
        Self::new(page.saturating_sub(1).saturating_mul(limit), limit)
    }

    /// Returns the number of items skipped.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Returns the maximum number of items returned.
    #[must_use]
    pub const fn limit(self) -> usize {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

/// One page of results with the total count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of matching items.
    pub total: usize,
    /// Request that produced the page.
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Maps page items while keeping pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

/// Filter for workflow listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowFilter {
    /// Only workflows for this platform.
    pub platform: Option<Platform>,
    /// Only workflows of this kind.
    pub kind: Option<WorkflowKind>,
    /// Include deactivated workflows.
    pub include_inactive: bool,
}

/// Workflow persistence contract.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Stores a new workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::DuplicateWorkflow`] when the ID
    /// exists or [`WorkflowRepositoryError::DuplicateActiveName`] when another
    /// active workflow on the platform has the same name.
    async fn store(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()>;

    /// Persists changes to an existing workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::NotFound`] when the workflow does
    /// not exist, or [`WorkflowRepositoryError::DuplicateActiveName`] when the
    /// change collides with another active workflow.
    async fn update(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()>;

    /// Finds a workflow by identifier, active or not.
    async fn find_by_id(&self, id: WorkflowId) -> WorkflowRepositoryResult<Option<Workflow>>;

    /// Finds the active workflow with the given platform and name.
    async fn find_active_by_name(
        &self,
        platform: Platform,
        name: &WorkflowName,
    ) -> WorkflowRepositoryResult<Option<Workflow>>;

    /// Finds the active auth workflow for a platform.
    async fn find_active_auth(
        &self,
        platform: Platform,
    ) -> WorkflowRepositoryResult<Option<Workflow>>;

    /// Lists workflows matching a filter, ordered by platform then name.
    async fn list(
        &self,
        filter: WorkflowFilter,
        page: PageRequest,
    ) -> WorkflowRepositoryResult<Page<Workflow>>;
}

/// Micro-action catalog persistence contract.
#[async_trait]
pub trait MicroActionRepository: Send + Sync {
    /// Stores a new micro-action.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::DuplicateMicroAction`] when the ID
    /// already exists.
    async fn store(&self, action: &MicroAction) -> WorkflowRepositoryResult<()>;

    /// Finds a micro-action by identifier.
    async fn find_by_id(&self, id: MicroActionId) -> WorkflowRepositoryResult<Option<MicroAction>>;

    /// Lists micro-actions for a platform.
    async fn list_for_platform(
        &self,
        platform: Platform,
    ) -> WorkflowRepositoryResult<Vec<MicroAction>>;
}

/// Errors returned by workflow repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowRepositoryError {
    /// A workflow with the same identifier already exists.
    #[error("duplicate workflow identifier: {0}")]
    DuplicateWorkflow(WorkflowId),

    /// Another active workflow has the same platform and name.
    #[error("an active {platform} workflow named '{name}' already exists")]
    DuplicateActiveName {
        /// Platform of the collision.
        platform: Platform,
        /// Colliding name.
        name: WorkflowName,
    },

    /// A micro-action with the same identifier already exists.
    #[error("duplicate micro-action identifier: {0}")]
    DuplicateMicroAction(MicroActionId),

    /// The workflow was not found.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
