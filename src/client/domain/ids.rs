//! Identifier types for the client registry.

use super::ClientDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted client identifier.
const MAX_CLIENT_ID_LEN: usize = 128;

/// Installation identifier chosen by the agent, e.g. `laptop-7f3a`.
///
/// Half of the credential pair; the other half is the api token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Creates a validated client identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClientDomainError::InvalidClientId`] when the value is empty,
    /// longer than 128 characters, or contains characters other than ASCII
    /// alphanumerics, `-`, `_`, and `.`.
    pub fn new(value: impl Into<String>) -> Result<Self, ClientDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_CLIENT_ID_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !is_valid {
            return Err(ClientDomainError::InvalidClientId(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ClientDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for String {
    fn from(value: ClientId) -> Self {
        value.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
