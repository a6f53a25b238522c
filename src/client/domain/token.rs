//! Api tokens and their stored hashes.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use std::fmt;

/// Random bytes in a freshly issued token.
const TOKEN_BYTES: usize = 32;

/// Plaintext api token, shown to the client once at issue time.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Issues a new random token (64 hex characters).
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a token presented by a client.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token for delivery to the client.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the hash stored in place of the token.
    #[must_use]
    pub fn hash(&self) -> TokenHash {
        TokenHash(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(..)")
    }
}

/// Hex SHA-256 of an api token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHash(String);

impl TokenHash {
    /// Rebuilds a hash from storage.
    #[must_use]
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a presented token in constant time.
    #[must_use]
    pub fn matches(&self, token: &ApiToken) -> bool {
        let presented = token.hash();
        bool::from(self.0.as_bytes().ct_eq(presented.0.as_bytes()))
    }
}
