//! Who the agent is and what it holds locally.

use crate::client::domain::{ApiToken, ClientId};
use crate::credential::domain::EncryptionKey;

/// Credentials the agent presents on every coordinator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Registered client identifier.
    pub client_id: ClientId,
    /// Api token issued at registration.
    pub api_token: ApiToken,
}

impl ClientCredentials {
    /// Bundles a client identifier with its token.
    #[must_use]
    pub const fn new(client_id: ClientId, api_token: ApiToken) -> Self {
        Self {
            client_id,
            api_token,
        }
    }
}

/// Agent credentials plus the installation key kept on the device.
///
/// The installation key decrypts account secrets locally; it is never sent
/// to the coordinator.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    /// Credentials for coordinator calls.
    pub credentials: ClientCredentials,
    /// Plaintext installation key.
    pub client_key: EncryptionKey,
}

impl AgentIdentity {
    /// Creates an identity.
    #[must_use]
    pub const fn new(credentials: ClientCredentials, client_key: EncryptionKey) -> Self {
        Self {
            credentials,
            client_key,
        }
    }
}
