//! In-memory client repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::{
    domain::{Client, ClientId},
    ports::{ClientRepository, ClientRepositoryError, ClientRepositoryResult},
};
use crate::owner::OwnerId;

/// Thread-safe in-memory client repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClientRepository {
    state: Arc<RwLock<HashMap<ClientId, Client>>>,
}

impl InMemoryClientRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> ClientRepositoryError {
    ClientRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn store(&self, client: &Client) -> ClientRepositoryResult<()> {
        let mut clients = self.state.write().map_err(lock_error)?;
        if clients.contains_key(client.client_id()) {
            return Err(ClientRepositoryError::DuplicateClient(
                client.client_id().clone(),
            ));
        }
        clients.insert(client.client_id().clone(), client.clone());
        Ok(())
    }

    async fn update(&self, client: &Client) -> ClientRepositoryResult<()> {
        let mut clients = self.state.write().map_err(lock_error)?;
        let Some(slot) = clients.get_mut(client.client_id()) else {
            return Err(ClientRepositoryError::NotFound(client.client_id().clone()));
        };
        *slot = client.clone();
        Ok(())
    }

    async fn find_by_client_id(
        &self,
        client_id: &ClientId,
    ) -> ClientRepositoryResult<Option<Client>> {
        let clients = self.state.read().map_err(lock_error)?;
        Ok(clients.get(client_id).cloned())
    }

    async fn list_for_owner(&self, owner: OwnerId) -> ClientRepositoryResult<Vec<Client>> {
        let clients = self.state.read().map_err(lock_error)?;
        let mut owned: Vec<Client> = clients
            .values()
            .filter(|client| client.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.client_id().cmp(b.client_id()));
        Ok(owned)
    }

    async fn remove(&self, client_id: &ClientId) -> ClientRepositoryResult<bool> {
        let mut clients = self.state.write().map_err(lock_error)?;
        Ok(clients.remove(client_id).is_some())
    }
}
