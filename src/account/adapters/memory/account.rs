//! In-memory account repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::account::{
    domain::{Account, AccountId},
    ports::{AccountRepository, AccountRepositoryError, AccountRepositoryResult},
};
use crate::owner::OwnerId;

/// Thread-safe in-memory account repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    state: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> AccountRepositoryError {
    AccountRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn store(&self, account: &Account) -> AccountRepositoryResult<()> {
        let mut accounts = self.state.write().map_err(lock_error)?;
        if accounts.contains_key(&account.id()) {
            return Err(AccountRepositoryError::DuplicateAccount(account.id()));
        }
        accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> AccountRepositoryResult<()> {
        let mut accounts = self.state.write().map_err(lock_error)?;
        let Some(slot) = accounts.get_mut(&account.id()) else {
            return Err(AccountRepositoryError::NotFound(account.id()));
        };
        *slot = account.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: AccountId) -> AccountRepositoryResult<Option<Account>> {
        let accounts = self.state.read().map_err(lock_error)?;
        Ok(accounts.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner: OwnerId) -> AccountRepositoryResult<Vec<Account>> {
        let accounts = self.state.read().map_err(lock_error)?;
        let mut owned: Vec<Account> = accounts
            .values()
            .filter(|account| account.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by_key(Account::created_at);
        Ok(owned)
    }
}
