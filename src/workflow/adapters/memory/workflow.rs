//! In-memory workflow repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::platform::Platform;
use crate::workflow::{
    domain::{Workflow, WorkflowId, WorkflowKind, WorkflowName},
    ports::{
        Page, PageRequest, WorkflowFilter, WorkflowRepository, WorkflowRepositoryError,
        WorkflowRepositoryResult,
    },
};

/// Thread-safe in-memory workflow repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowRepository {
    state: Arc<RwLock<HashMap<WorkflowId, Workflow>>>,
}

impl InMemoryWorkflowRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> WorkflowRepositoryError {
    WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Returns an error when another active workflow shares platform and name.
fn check_active_name(
    workflows: &HashMap<WorkflowId, Workflow>,
    candidate: &Workflow,
) -> WorkflowRepositoryResult<()> {
    if !candidate.is_active() {
        return Ok(());
    }
    let collides = workflows.values().any(|existing| {
        existing.id() != candidate.id()
            && existing.is_active()
            && existing.platform() == candidate.platform()
            && existing.name() == candidate.name()
    });
    if collides {
        return Err(WorkflowRepositoryError::DuplicateActiveName {
            platform: candidate.platform(),
            name: candidate.name().clone(),
        });
    }
    Ok(())
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn store(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()> {
        let mut workflows = self.state.write().map_err(lock_error)?;
        if workflows.contains_key(&workflow.id()) {
            return Err(WorkflowRepositoryError::DuplicateWorkflow(workflow.id()));
        }
        check_active_name(&workflows, workflow)?;
        workflows.insert(workflow.id(), workflow.clone());
        Ok(())
    }

    async fn update(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()> {
        let mut workflows = self.state.write().map_err(lock_error)?;
        if !workflows.contains_key(&workflow.id()) {
            return Err(WorkflowRepositoryError::NotFound(workflow.id()));
        }
        check_active_name(&workflows, workflow)?;
        workflows.insert(workflow.id(), workflow.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: WorkflowId) -> WorkflowRepositoryResult<Option<Workflow>> {
        let workflows = self.state.read().map_err(lock_error)?;
        Ok(workflows.get(&id).cloned())
    }

    async fn find_active_by_name(
        &self,
        platform: Platform,
        name: &WorkflowName,
    ) -> WorkflowRepositoryResult<Option<Workflow>> {
        let workflows = self.state.read().map_err(lock_error)?;
        Ok(workflows
            .values()
            .find(|w| w.is_active() && w.platform() == platform && w.name() == name)
            .cloned())
    }

    async fn find_active_auth(
        &self,
        platform: Platform,
    ) -> WorkflowRepositoryResult<Option<Workflow>> {
        let workflows = self.state.read().map_err(lock_error)?;
        let mut candidates: Vec<&Workflow> = workflows
            .values()
            .filter(|w| w.is_active() && w.platform() == platform && w.kind() == WorkflowKind::Auth)
            .collect();
        candidates.sort_by_key(|w| w.created_at());
        Ok(candidates.first().map(|w| (*w).clone()))
    }

    async fn list(
        &self,
        filter: WorkflowFilter,
        page: PageRequest,
    ) -> WorkflowRepositoryResult<Page<Workflow>> {
        let workflows = self.state.read().map_err(lock_error)?;
        let mut matching: Vec<Workflow> = workflows
            .values()
            .filter(|w| filter.include_inactive || w.is_active())
            .filter(|w| filter.platform.is_none_or(|platform| w.platform() == platform))
            .filter(|w| filter.kind.is_none_or(|kind| w.kind() == kind))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.platform()
                .as_str()
                .cmp(b.platform().as_str())
                .then_with(|| a.name().as_str().cmp(b.name().as_str()))
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        Ok(Page {
            items,
            total,
            request: page,
        })
    }
}
