//! Repository port for registered clients.

use crate::client::domain::{Client, ClientId};
use crate::owner::OwnerId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for client repository operations.
pub type ClientRepositoryResult<T> = Result<T, ClientRepositoryError>;

/// Client persistence contract.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Stores a newly registered client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRepositoryError::DuplicateClient`] when the client
    /// identifier is taken.
    async fn store(&self, client: &Client) -> ClientRepositoryResult<()>;

    /// Replaces an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRepositoryError::NotFound`] when the client does not
    /// exist.
    async fn update(&self, client: &Client) -> ClientRepositoryResult<()>;

    /// Finds a client by identifier.
    async fn find_by_client_id(&self, client_id: &ClientId)
    -> ClientRepositoryResult<Option<Client>>;

    /// Lists an owner's clients ordered by identifier.
    async fn list_for_owner(&self, owner: OwnerId) -> ClientRepositoryResult<Vec<Client>>;

    /// Removes a client. Returns `false` when it did not exist.
    async fn remove(&self, client_id: &ClientId) -> ClientRepositoryResult<bool>;
}

/// Errors returned by client repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ClientRepositoryError {
    /// A client with the same identifier already exists.
    #[error("duplicate client identifier: {0}")]
    DuplicateClient(ClientId),

    /// The client was not found.
    #[error("client not found: {0}")]
    NotFound(ClientId),

    /// Persistence failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ClientRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
