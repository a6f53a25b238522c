//! Client aggregate root.

use super::{ApiToken, ClientDomainError, ClientId, ClientStatus, TokenHash};
use crate::credential::domain::{SealedKey, SessionFingerprint, WrappedKey};
use crate::owner::OwnerId;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;

/// A wrapped key cached for one user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedWrappedKey {
    /// Fingerprint of the session the key was wrapped for.
    pub session: SessionFingerprint,
    /// Key wrapped under that session's derived key.
    pub wrapped: WrappedKey,
}

/// Input for registering a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    /// Owner of the installation.
    pub owner: OwnerId,
    /// Installation identifier.
    pub client_id: ClientId,
    /// Hash of the issued api token.
    pub token_hash: TokenHash,
    /// Expiry of the issued api token.
    pub token_expires_at: DateTime<Utc>,
    /// Reported agent version.
    pub agent_version: String,
    /// Install key sealed under the server master key.
    pub sealed_key: SealedKey,
}

/// Parameter object for reconstructing a persisted client.
#[derive(Debug, Clone)]
pub struct PersistedClientData {
    /// Persisted owner.
    pub owner: OwnerId,
    /// Persisted identifier.
    pub client_id: ClientId,
    /// Persisted token hash.
    pub token_hash: TokenHash,
    /// Persisted token expiry.
    pub token_expires_at: DateTime<Utc>,
    /// Persisted status.
    pub status: ClientStatus,
    /// Persisted last authenticated contact.
    pub last_seen: Option<DateTime<Utc>>,
    /// Persisted last heartbeat.
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Persisted agent version.
    pub agent_version: String,
    /// Persisted sealed install key.
    pub sealed_key: SealedKey,
    /// Persisted wrapped-key cache entry.
    pub cached_key: Option<CachedWrappedKey>,
    /// Persisted registration timestamp.
    pub registered_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Registered agent installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    owner: OwnerId,
    client_id: ClientId,
    token_hash: TokenHash,
    token_expires_at: DateTime<Utc>,
    status: ClientStatus,
    last_seen: Option<DateTime<Utc>>,
    last_heartbeat: Option<DateTime<Utc>>,
    agent_version: String,
    sealed_key: SealedKey,
    cached_key: Option<CachedWrappedKey>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Client {
    /// Registers a client. Registration counts as the first heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`ClientDomainError::EmptyAgentVersion`] when the version is
    /// blank.
    pub fn new(data: NewClient, clock: &impl Clock) -> Result<Self, ClientDomainError> {
        let agent_version = normalize_version(data.agent_version)?;
        let now = clock.utc();
        Ok(Self {
            owner: data.owner,
            client_id: data.client_id,
            token_hash: data.token_hash,
            token_expires_at: data.token_expires_at,
            status: ClientStatus::Online,
            last_seen: Some(now),
            last_heartbeat: Some(now),
            agent_version,
            sealed_key: data.sealed_key,
            cached_key: None,
            registered_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a client from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedClientData) -> Self {
        Self {
            owner: data.owner,
            client_id: data.client_id,
            token_hash: data.token_hash,
            token_expires_at: data.token_expires_at,
            status: data.status,
            last_seen: data.last_seen,
            last_heartbeat: data.last_heartbeat,
            agent_version: data.agent_version,
            sealed_key: data.sealed_key,
            cached_key: data.cached_key,
            registered_at: data.registered_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the owner.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the installation identifier.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the stored token hash.
    #[must_use]
    pub const fn token_hash(&self) -> &TokenHash {
        &self.token_hash
    }

    /// Returns the token expiry.
    #[must_use]
    pub const fn token_expires_at(&self) -> DateTime<Utc> {
        self.token_expires_at
    }

    /// Returns the last self-reported status.
    #[must_use]
    pub const fn status(&self) -> ClientStatus {
        self.status
    }

    /// Returns the last authenticated contact.
    #[must_use]
    pub const fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Returns the last heartbeat.
    #[must_use]
    pub const fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        self.last_heartbeat
    }

    /// Returns the agent version.
    #[must_use]
    pub fn agent_version(&self) -> &str {
        &self.agent_version
    }

    /// Returns the sealed install key.
    #[must_use]
    pub const fn sealed_key(&self) -> &SealedKey {
        &self.sealed_key
    }

    /// Returns the wrapped-key cache entry.
    #[must_use]
    pub const fn cached_key(&self) -> Option<&CachedWrappedKey> {
        self.cached_key.as_ref()
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks a presented api token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientDomainError::TokenMismatch`] for a wrong token and
    /// [`ClientDomainError::TokenExpired`] when the token's expiry is before
    /// `now`.
    pub fn verify_token(&self, token: &ApiToken, now: DateTime<Utc>) -> Result<(), ClientDomainError> {
        if !self.token_hash.matches(token) {
            return Err(ClientDomainError::TokenMismatch);
        }
        if self.token_expires_at < now {
            return Err(ClientDomainError::TokenExpired {
                expired_at: self.token_expires_at,
            });
        }
        Ok(())
    }

    /// Records a heartbeat. Repeating one only moves the timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ClientDomainError::EmptyAgentVersion`] when a blank version
    /// is reported.
    pub fn record_heartbeat(
        &mut self,
        status: Option<ClientStatus>,
        agent_version: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), ClientDomainError> {
        if let Some(version) = agent_version {
            self.agent_version = normalize_version(version)?;
        }
        let now = clock.utc();
        self.status = status.unwrap_or(ClientStatus::Online);
        self.last_seen = Some(now);
        self.last_heartbeat = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Returns `true` while the last heartbeat is younger than `threshold`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.last_heartbeat
            .is_some_and(|beat| now.signed_duration_since(beat) < threshold)
    }

    /// Returns the status to display: the reported one while live, else
    /// `offline`.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>, threshold: Duration) -> ClientStatus {
        if self.is_live(now, threshold) {
            self.status
        } else {
            ClientStatus::Offline
        }
    }

    /// Replaces the api token and drops cached wrapped keys.
    pub fn rotate_token(&mut self, hash: TokenHash, expires_at: DateTime<Utc>, clock: &impl Clock) {
        self.token_hash = hash;
        self.token_expires_at = expires_at;
        self.cached_key = None;
        self.updated_at = clock.utc();
    }

    /// Returns the cached wrapped key for `session`, if one exists.
    #[must_use]
    pub fn wrapped_key_for(&self, session: &SessionFingerprint) -> Option<&WrappedKey> {
        self.cached_key
            .as_ref()
            .filter(|cached| &cached.session == session)
            .map(|cached| &cached.wrapped)
    }

    /// Caches a wrapped key for `session`, replacing any other session's.
    pub fn cache_wrapped_key(
        &mut self,
        session: SessionFingerprint,
        wrapped: WrappedKey,
        clock: &impl Clock,
    ) {
        self.cached_key = Some(CachedWrappedKey { session, wrapped });
        self.updated_at = clock.utc();
    }
}

fn normalize_version(version: String) -> Result<String, ClientDomainError> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return Err(ClientDomainError::EmptyAgentVersion);
    }
    Ok(trimmed.to_owned())
}
