//! Symmetric key material.

use super::CredentialError;
use rand::RngCore;
use std::fmt;

/// Length of an AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key.
///
/// Used for client installation keys, the server master key, and derived
/// session keys. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Generates a random key from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps existing key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parses key bytes from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidKeyLength`] unless the slice holds
    /// exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CredentialError> {
        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CredentialError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Parses a hex-encoded key, e.g. a master key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Malformed`] for invalid hex or
    /// [`CredentialError::InvalidKeyLength`] for the wrong size.
    pub fn from_hex(encoded: &str) -> Result<Self, CredentialError> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| CredentialError::Malformed)?;
        Self::from_slice(&bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
