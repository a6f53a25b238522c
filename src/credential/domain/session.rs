//! User session tokens issued by the external identity provider.

use sha2::{Digest, Sha256};
use std::fmt;

/// Bearer token of an authenticated user session.
///
/// The token is an input to key derivation, so it is never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a session token.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns a stable, non-reversible fingerprint of the token.
    #[must_use]
    pub fn fingerprint(&self) -> SessionFingerprint {
        SessionFingerprint(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Hex SHA-256 of a session token, used to key cached wrapped keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionFingerprint(String);

impl SessionFingerprint {
    /// Rebuilds a fingerprint from storage.
    #[must_use]
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
