//! Account aggregate root.

use super::{AccountDomainError, AccountId, AccountStatus, AuthOutcome};
use crate::client::domain::ClientId;
use crate::credential::domain::EncryptedSecret;
use crate::owner::OwnerId;
use crate::platform::Platform;
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Input for linking an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Owner of the account.
    pub owner: OwnerId,
    /// Platform the account belongs to.
    pub platform: Platform,
    /// Login name on the platform.
    pub username: String,
    /// Client whose key encrypted the secret.
    pub client_id: ClientId,
    /// Password or session secret, encrypted under the client key.
    pub encrypted_secret: EncryptedSecret,
}

/// Parameter object for reconstructing a persisted account.
#[derive(Debug, Clone)]
pub struct PersistedAccountData {
    /// Persisted identifier.
    pub id: AccountId,
    /// Persisted owner.
    pub owner: OwnerId,
    /// Persisted platform.
    pub platform: Platform,
    /// Persisted username.
    pub username: String,
    /// Persisted encrypting client.
    pub client_id: ClientId,
    /// Persisted secret ciphertext.
    pub encrypted_secret: EncryptedSecret,
    /// Persisted status.
    pub status: AccountStatus,
    /// Persisted last successful verification.
    pub last_verified_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Linked platform account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    owner: OwnerId,
    platform: Platform,
    username: String,
    client_id: ClientId,
    encrypted_secret: EncryptedSecret,
    status: AccountStatus,
    last_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Links an account in `pending_verification`.
    ///
    /// # Errors
    ///
    /// Returns [`AccountDomainError::EmptyUsername`] when the username is
    /// blank.
    pub fn new(data: NewAccount, clock: &impl Clock) -> Result<Self, AccountDomainError> {
        let username = data.username.trim().to_owned();
        if username.is_empty() {
            return Err(AccountDomainError::EmptyUsername);
        }
        let now = clock.utc();
        Ok(Self {
            id: AccountId::new(),
            owner: data.owner,
            platform: data.platform,
            username,
            client_id: data.client_id,
            encrypted_secret: data.encrypted_secret,
            status: AccountStatus::PendingVerification,
            last_verified_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs an account from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAccountData) -> Self {
        Self {
            id: data.id,
            owner: data.owner,
            platform: data.platform,
            username: data.username,
            client_id: data.client_id,
            encrypted_secret: data.encrypted_secret,
            status: data.status,
            last_verified_at: data.last_verified_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the account identifier.
    #[must_use]
    pub const fn id(&self) -> AccountId {
        self.id
    }

    /// Returns the owner.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the platform.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the platform username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the client whose key encrypted the secret.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the secret ciphertext.
    #[must_use]
    pub const fn encrypted_secret(&self) -> &EncryptedSecret {
        &self.encrypted_secret
    }

    /// Returns the verification status.
    #[must_use]
    pub const fn status(&self) -> AccountStatus {
        self.status
    }

    /// Returns the last successful verification.
    #[must_use]
    pub const fn last_verified_at(&self) -> Option<DateTime<Utc>> {
        self.last_verified_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Puts a failed or re-auth account back into verification.
    ///
    /// Pending and active accounts are left as they are.
    pub fn request_verification(&mut self, clock: &impl Clock) {
        if self
            .status
            .can_transition_to(AccountStatus::PendingVerification)
        {
            self.status = AccountStatus::PendingVerification;
            self.updated_at = clock.utc();
        }
    }

    /// Applies an auth run outcome. Outcomes that repeat the current status
    /// are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`AccountDomainError::InvalidTransition`] when the outcome's
    /// target status is unreachable, e.g. verifying a `login_failed` account
    /// that was never put back into verification.
    pub fn record_auth_outcome(
        &mut self,
        outcome: AuthOutcome,
        clock: &impl Clock,
    ) -> Result<(), AccountDomainError> {
        let target = outcome.target_status(self.status);
        let now = clock.utc();
        if target == self.status {
            if target == AccountStatus::Active {
                self.last_verified_at = Some(now);
                self.updated_at = now;
            }
            return Ok(());
        }
        if !self.status.can_transition_to(target) {
            return Err(AccountDomainError::InvalidTransition {
                account_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        if target == AccountStatus::Active {
            self.last_verified_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }
}
