//! Repository port for linked accounts.

use crate::account::domain::{Account, AccountId};
use crate::owner::OwnerId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for account repository operations.
pub type AccountRepositoryResult<T> = Result<T, AccountRepositoryError>;

/// Account persistence contract.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Stores a newly linked account.
    async fn store(&self, account: &Account) -> AccountRepositoryResult<()>;

    /// Replaces an existing account.
    async fn update(&self, account: &Account) -> AccountRepositoryResult<()>;

    /// Finds an account by identifier.
    async fn find_by_id(&self, id: AccountId) -> AccountRepositoryResult<Option<Account>>;

    /// Lists an owner's accounts, oldest first.
    async fn list_for_owner(&self, owner: OwnerId) -> AccountRepositoryResult<Vec<Account>>;
}

/// Errors returned by account repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AccountRepositoryError {
    /// An account with the same identifier already exists.
    #[error("duplicate account identifier: {0}")]
    DuplicateAccount(AccountId),

    /// The account was not found.
    #[error("account not found: {0}")]
    NotFound(AccountId),

    /// Persistence failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AccountRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
