//! Service layer for client registration, authentication, and heartbeats.
//!
//! Provides [`ClientRegistryService`], which also hands out session-wrapped
//! client keys and acts as the job queue's claim gate.

use crate::client::{
    domain::{ApiToken, Client, ClientDomainError, ClientId, ClientStatus, NewClient},
    ports::{ClientRepository, ClientRepositoryError},
};
use crate::config::ClientRegistryConfig;
use crate::credential::{
    domain::{CredentialError, EncryptionKey, SessionToken, WrappedKey},
    services::CredentialBroker,
};
use crate::error::{Classify, ErrorKind};
use crate::job::ports::{ClaimEligibility, EligibilityError};
use crate::owner::OwnerId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for registering a client installation.
#[derive(Debug, Clone)]
pub struct RegisterClientRequest {
    client_id: String,
    agent_version: String,
    install_key: EncryptionKey,
}

impl RegisterClientRequest {
    /// Creates a registration request carrying the device's install key.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        agent_version: impl Into<String>,
        install_key: EncryptionKey,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            agent_version: agent_version.into(),
            install_key,
        }
    }
}

/// Request payload for a heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatRequest {
    /// Reported status; `online` when absent.
    pub status: Option<ClientStatus>,
    /// Reported agent version; unchanged when absent.
    pub agent_version: Option<String>,
}

/// A newly registered client with its one-time plaintext token.
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    /// Stored client record.
    pub client: Client,
    /// Api token to deliver to the installation.
    pub api_token: ApiToken,
}

/// A client with liveness evaluated at listing time.
#[derive(Debug, Clone)]
pub struct ClientSummary {
    /// Stored client record.
    pub client: Client,
    /// Whether the client may currently claim jobs.
    pub live: bool,
    /// Reported status, or `offline` when stale.
    pub effective_status: ClientStatus,
}

/// Service-level errors for client registry operations.
#[derive(Debug, Error)]
pub enum ClientRegistryError {
    /// Domain validation or credential check failed.
    #[error(transparent)]
    Domain(#[from] ClientDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ClientRepositoryError),

    /// Key sealing or wrapping failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// No client matches the presented credentials.
    #[error("invalid client credentials")]
    UnknownClient,

    /// The client does not exist or belongs to another owner.
    #[error("client not found: {0}")]
    NotFound(ClientId),
}

impl Classify for ClientRegistryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(ClientDomainError::TokenMismatch | ClientDomainError::TokenExpired { .. })
            | Self::UnknownClient => ErrorKind::Unauthorized,
            Self::Domain(_) => ErrorKind::Validation,
            Self::Repository(ClientRepositoryError::DuplicateClient(_)) => ErrorKind::InvalidState,
            Self::Repository(ClientRepositoryError::NotFound(_)) | Self::NotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Repository(_) | Self::Credential(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for client registry operations.
pub type ClientRegistryResult<T> = Result<T, ClientRegistryError>;

/// Client registration, authentication, and liveness service.
pub struct ClientRegistryService<R, C>
where
    R: ClientRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    broker: Arc<CredentialBroker>,
    clock: Arc<C>,
    config: ClientRegistryConfig,
}

impl<R, C> Clone for ClientRegistryService<R, C>
where
    R: ClientRepository + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            broker: Arc::clone(&self.broker),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<R, C> ClientRegistryService<R, C>
where
    R: ClientRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new client registry service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        broker: Arc<CredentialBroker>,
        clock: Arc<C>,
        config: ClientRegistryConfig,
    ) -> Self {
        Self {
            repository,
            broker,
            clock,
            config,
        }
    }

    /// Registers an installation and issues its api token.
    ///
    /// The install key is sealed under the master key before storage.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError`] when the identifier or version is
    /// invalid, the identifier is taken, or sealing fails.
    pub async fn register(
        &self,
        owner: OwnerId,
        request: RegisterClientRequest,
    ) -> ClientRegistryResult<RegisteredClient> {
        let RegisterClientRequest {
            client_id,
            agent_version,
            install_key,
        } = request;
        let client_id = ClientId::new(client_id)?;
        let api_token = ApiToken::generate();
        let client = Client::new(
            NewClient {
                owner,
                client_id,
                token_hash: api_token.hash(),
                token_expires_at: self.token_expiry(),
                agent_version,
                sealed_key: self.broker.seal_install_key(&install_key)?,
            },
            &*self.clock,
        )?;
        self.repository.store(&client).await?;
        tracing::info!(client_id = %client.client_id(), owner = %owner, "registered client");
        Ok(RegisteredClient { client, api_token })
    }

    /// Authenticates a client by its credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError::UnknownClient`] for an unknown
    /// identifier and [`ClientRegistryError::Domain`] with
    /// [`ClientDomainError::TokenMismatch`] or
    /// [`ClientDomainError::TokenExpired`] for a bad token.
    pub async fn authenticate(
        &self,
        client_id: &ClientId,
        token: &ApiToken,
    ) -> ClientRegistryResult<Client> {
        let client = self
            .repository
            .find_by_client_id(client_id)
            .await?
            .ok_or(ClientRegistryError::UnknownClient)?;
        client.verify_token(token, self.clock.utc())?;
        Ok(client)
    }

    /// Records a heartbeat from an authenticated client.
    ///
    /// Nothing is written when authentication fails.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError`] when authentication fails or the
    /// update cannot be persisted.
    pub async fn heartbeat(
        &self,
        client_id: &ClientId,
        token: &ApiToken,
        request: HeartbeatRequest,
    ) -> ClientRegistryResult<Client> {
        let mut client = self.authenticate(client_id, token).await?;
        let was_live = self.is_live(&client);
        client.record_heartbeat(request.status, request.agent_version, &*self.clock)?;
        self.repository.update(&client).await?;
        if !was_live {
            tracing::info!(client_id = %client_id, "client resumed heartbeats");
        }
        tracing::debug!(client_id = %client_id, status = %client.status(), "heartbeat");
        Ok(client)
    }

    /// Removes a client after checking both credential halves.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError`] when authentication fails.
    pub async fn deregister(&self, client_id: &ClientId, token: &ApiToken) -> ClientRegistryResult<()> {
        self.authenticate(client_id, token).await?;
        self.repository.remove(client_id).await?;
        tracing::info!(client_id = %client_id, "deregistered client");
        Ok(())
    }

    /// Removes a client without credentials, for administrators.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError::NotFound`] when the client does not
    /// exist.
    pub async fn admin_deregister(&self, client_id: &ClientId) -> ClientRegistryResult<()> {
        if !self.repository.remove(client_id).await? {
            return Err(ClientRegistryError::NotFound(client_id.clone()));
        }
        tracing::info!(client_id = %client_id, "administratively deregistered client");
        Ok(())
    }

    /// Issues a new api token, invalidating the presented one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError`] when authentication fails.
    pub async fn rotate_token(
        &self,
        client_id: &ClientId,
        token: &ApiToken,
    ) -> ClientRegistryResult<ApiToken> {
        let mut client = self.authenticate(client_id, token).await?;
        let fresh = ApiToken::generate();
        client.rotate_token(fresh.hash(), self.token_expiry(), &*self.clock);
        self.repository.update(&client).await?;
        tracing::info!(client_id = %client_id, "rotated api token");
        Ok(fresh)
    }

    /// Returns an owner's client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError::NotFound`] when the client is absent or
    /// owned by someone else.
    pub async fn find(&self, owner: OwnerId, client_id: &ClientId) -> ClientRegistryResult<Client> {
        self.repository
            .find_by_client_id(client_id)
            .await?
            .filter(|client| client.owner() == owner)
            .ok_or_else(|| ClientRegistryError::NotFound(client_id.clone()))
    }

    /// Lists an owner's clients with liveness evaluated now.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError::Repository`] when the lookup fails.
    pub async fn list(&self, owner: OwnerId) -> ClientRegistryResult<Vec<ClientSummary>> {
        let now = self.clock.utc();
        let threshold = self.config.staleness_threshold();
        let clients = self.repository.list_for_owner(owner).await?;
        Ok(clients
            .into_iter()
            .map(|client| ClientSummary {
                live: client.is_live(now, threshold),
                effective_status: client.effective_status(now, threshold),
                client,
            })
            .collect())
    }

    /// Returns the client key wrapped for the caller's session.
    ///
    /// A cached wrap is reused only for the same session; any other session
    /// gets a fresh wrap, which replaces the cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientRegistryError::NotFound`] when the client is not the
    /// owner's, or [`ClientRegistryError::Credential`] when wrapping fails.
    pub async fn wrapped_client_key(
        &self,
        owner: OwnerId,
        client_id: &ClientId,
        session: &SessionToken,
    ) -> ClientRegistryResult<WrappedKey> {
        let mut client = self.find(owner, client_id).await?;
        let fingerprint = session.fingerprint();
        if let Some(cached) = client.wrapped_key_for(&fingerprint) {
            return Ok(cached.clone());
        }
        let wrapped = self
            .broker
            .wrap_for_session(client.sealed_key(), owner, session)?;
        client.cache_wrapped_key(fingerprint, wrapped.clone(), &*self.clock);
        self.repository.update(&client).await?;
        tracing::debug!(client_id = %client_id, "wrapped client key for session");
        Ok(wrapped)
    }

    fn token_expiry(&self) -> DateTime<Utc> {
        let now = self.clock.utc();
        now.checked_add_signed(self.config.token_ttl())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn is_live(&self, client: &Client) -> bool {
        client.is_live(self.clock.utc(), self.config.staleness_threshold())
    }
}

#[async_trait]
impl<R, C> ClaimEligibility for ClientRegistryService<R, C>
where
    R: ClientRepository + ?Sized,
    C: Clock + Send + Sync,
{
    async fn ensure_eligible(&self, client_id: &ClientId) -> Result<(), EligibilityError> {
        let client = self
            .repository
            .find_by_client_id(client_id)
            .await
            .map_err(EligibilityError::lookup)?
            .ok_or_else(|| EligibilityError::Unknown(client_id.clone()))?;
        if self.is_live(&client) {
            return Ok(());
        }
        tracing::warn!(
            client_id = %client_id,
            last_heartbeat = ?client.last_heartbeat(),
            "stale client refused new claims"
        );
        Err(EligibilityError::Stale {
            client_id: client_id.clone(),
            last_heartbeat: client.last_heartbeat(),
        })
    }
}
