//! In-memory micro-action catalog.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::platform::Platform;
use crate::workflow::{
    domain::{MicroAction, MicroActionId},
    ports::{MicroActionRepository, WorkflowRepositoryError, WorkflowRepositoryResult},
};

/// Thread-safe in-memory micro-action catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMicroActionRepository {
    state: Arc<RwLock<HashMap<MicroActionId, MicroAction>>>,
}

impl InMemoryMicroActionRepository {
    /// Creates an empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> WorkflowRepositoryError {
    WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl MicroActionRepository for InMemoryMicroActionRepository {
    async fn store(&self, action: &MicroAction) -> WorkflowRepositoryResult<()> {
        let mut actions = self.state.write().map_err(lock_error)?;
        if actions.contains_key(&action.id()) {
            return Err(WorkflowRepositoryError::DuplicateMicroAction(action.id()));
        }
        actions.insert(action.id(), action.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MicroActionId) -> WorkflowRepositoryResult<Option<MicroAction>> {
        let actions = self.state.read().map_err(lock_error)?;
        Ok(actions.get(&id).cloned())
    }

    async fn list_for_platform(
        &self,
        platform: Platform,
    ) -> WorkflowRepositoryResult<Vec<MicroAction>> {
        let actions = self.state.read().map_err(lock_error)?;
        let mut matching: Vec<MicroAction> = actions
            .values()
            .filter(|action| action.platform() == platform)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(matching)
    }
}
