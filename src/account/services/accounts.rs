//! Service layer for linking accounts and driving their verification state.

use crate::account::{
    domain::{Account, AccountDomainError, AccountId, AuthOutcome, NewAccount},
    ports::{AccountRepository, AccountRepositoryError},
};
use crate::client::domain::ClientId;
use crate::credential::domain::EncryptedSecret;
use crate::error::{Classify, ErrorKind};
use crate::owner::OwnerId;
use crate::platform::Platform;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for linking a platform account.
#[derive(Debug, Clone)]
pub struct LinkAccountRequest {
    platform: Platform,
    username: String,
    client_id: ClientId,
    encrypted_secret: EncryptedSecret,
}

impl LinkAccountRequest {
    /// Creates a link request. The secret must already be encrypted under
    /// the client's key.
    #[must_use]
    pub fn new(
        platform: Platform,
        username: impl Into<String>,
        client_id: ClientId,
        encrypted_secret: EncryptedSecret,
    ) -> Self {
        Self {
            platform,
            username: username.into(),
            client_id,
            encrypted_secret,
        }
    }
}

/// Service-level errors for account operations.
#[derive(Debug, Error)]
pub enum AccountServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] AccountDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] AccountRepositoryError),

    /// The account does not exist or belongs to another owner.
    #[error("account not found: {0}")]
    NotFound(AccountId),
}

impl Classify for AccountServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(AccountDomainError::EmptyUsername) => ErrorKind::Validation,
            Self::Domain(AccountDomainError::InvalidTransition { .. }) => ErrorKind::InvalidState,
            Self::Repository(AccountRepositoryError::NotFound(_)) | Self::NotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Repository(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for account service operations.
pub type AccountServiceResult<T> = Result<T, AccountServiceError>;

/// Account linking and verification service.
pub struct AccountService<R, C>
where
    R: AccountRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for AccountService<R, C>
where
    R: AccountRepository + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> AccountService<R, C>
where
    R: AccountRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new account service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Links an account in `pending_verification`.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError`] when the username is blank or
    /// persistence fails.
    pub async fn link(
        &self,
        owner: OwnerId,
        request: LinkAccountRequest,
    ) -> AccountServiceResult<Account> {
        let account = Account::new(
            NewAccount {
                owner,
                platform: request.platform,
                username: request.username,
                client_id: request.client_id,
                encrypted_secret: request.encrypted_secret,
            },
            &*self.clock,
        )?;
        self.repository.store(&account).await?;
        tracing::info!(account_id = %account.id(), platform = %account.platform(), "linked account");
        Ok(account)
    }

    /// Returns an owner's account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::NotFound`] when the account is absent
    /// or owned by someone else.
    pub async fn get(&self, owner: OwnerId, id: AccountId) -> AccountServiceResult<Account> {
        self.repository
            .find_by_id(id)
            .await?
            .filter(|account| account.owner() == owner)
            .ok_or(AccountServiceError::NotFound(id))
    }

    /// Returns an account regardless of owner, for the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::NotFound`] when the account is absent.
    pub async fn find(&self, id: AccountId) -> AccountServiceResult<Account> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountServiceError::NotFound(id))
    }

    /// Lists an owner's accounts.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::Repository`] when the lookup fails.
    pub async fn list(&self, owner: OwnerId) -> AccountServiceResult<Vec<Account>> {
        Ok(self.repository.list_for_owner(owner).await?)
    }

    /// Puts an account back into verification ahead of an auth job.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::NotFound`] when the account is absent
    /// or not owned.
    pub async fn request_verification(
        &self,
        owner: OwnerId,
        id: AccountId,
    ) -> AccountServiceResult<Account> {
        let mut account = self.get(owner, id).await?;
        let before = account.status();
        account.request_verification(&*self.clock);
        if account.status() != before {
            self.repository.update(&account).await?;
            tracing::info!(account_id = %id, from = %before, "account queued for verification");
        }
        Ok(account)
    }

    /// Applies an auth run outcome reported by the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::Domain`] when the transition is not
    /// allowed from the current status.
    pub async fn record_auth_outcome(
        &self,
        id: AccountId,
        outcome: AuthOutcome,
    ) -> AccountServiceResult<Account> {
        let mut account = self.find(id).await?;
        let before = account.status();
        account.record_auth_outcome(outcome, &*self.clock)?;
        self.repository.update(&account).await?;
        tracing::info!(
            account_id = %id,
            from = %before,
            to = %account.status(),
            outcome = ?outcome,
            "recorded auth outcome"
        );
        Ok(account)
    }
}
