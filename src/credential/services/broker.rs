//! Server-side key handoff and trusted-side unwrapping.

use crate::credential::{
    cipher,
    domain::{
        CredentialError, EncryptedSecret, EncryptionKey, SealedKey, SessionToken, WrappedKey,
    },
};
use crate::owner::OwnerId;

/// Seals client keys for storage and re-wraps them for user sessions.
///
/// The broker holds the server master key. It can open a sealed install key
/// only to re-wrap it; it never decrypts account secrets.
#[derive(Debug, Clone)]
pub struct CredentialBroker {
    master_key: EncryptionKey,
}

impl CredentialBroker {
    /// Creates a broker around the server master key.
    #[must_use]
    pub const fn new(master_key: EncryptionKey) -> Self {
        Self { master_key }
    }

    /// Seals a client install key for storage on the client record.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Encrypt`] when sealing fails.
    pub fn seal_install_key(&self, client_key: &EncryptionKey) -> Result<SealedKey, CredentialError> {
        cipher::seal(&self.master_key, client_key.as_bytes()).map(SealedKey::from_bytes)
    }

    /// Re-wraps a sealed install key under the session key
    /// `SHA-256(session_token || owner)` for transport to a trusted device.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the sealed key cannot be opened with
    /// the master key or re-encryption fails.
    pub fn wrap_for_session(
        &self,
        sealed: &SealedKey,
        owner: OwnerId,
        session: &SessionToken,
    ) -> Result<WrappedKey, CredentialError> {
        let client_key =
            EncryptionKey::from_slice(&cipher::open(&self.master_key, sealed.as_bytes())?)?;
        let session_key = cipher::derive_session_key(session.expose(), owner);
        cipher::seal(&session_key, client_key.as_bytes()).map(WrappedKey::from_bytes)
    }

    /// Recovers the client key on a trusted device.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Decrypt`] when the session or owner does
    /// not match the one the key was wrapped for.
    pub fn unwrap_client_key(
        wrapped: &WrappedKey,
        owner: OwnerId,
        session: &SessionToken,
    ) -> Result<EncryptionKey, CredentialError> {
        let session_key = cipher::derive_session_key(session.expose(), owner);
        EncryptionKey::from_slice(&cipher::open(&session_key, wrapped.as_bytes())?)
    }

    /// Encrypts an account secret under a client key.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Encrypt`] when encryption fails.
    pub fn encrypt_secret(
        client_key: &EncryptionKey,
        secret: &str,
    ) -> Result<EncryptedSecret, CredentialError> {
        cipher::seal(client_key, secret.as_bytes()).map(EncryptedSecret::from_bytes)
    }

    /// Decrypts an account secret with the client key.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Decrypt`] for the wrong key or tampered
    /// data, or [`CredentialError::NotUtf8`] when the plaintext is not text.
    pub fn decrypt_secret(
        client_key: &EncryptionKey,
        encrypted: &EncryptedSecret,
    ) -> Result<String, CredentialError> {
        let plaintext = cipher::open(client_key, encrypted.as_bytes())?;
        String::from_utf8(plaintext).map_err(|_| CredentialError::NotUtf8)
    }
}
