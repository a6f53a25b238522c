//! AES-256-GCM sealing with the `nonce (12 bytes) || ciphertext || tag` layout.

use super::domain::{CredentialError, EncryptionKey};
use crate::owner::OwnerId;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag appended by AES-GCM.
const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns [`CredentialError::Encrypt`] when the cipher rejects the input.
pub fn seal(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>, CredentialError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|err| CredentialError::Encrypt(err.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|err| CredentialError::Encrypt(err.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypts data produced by [`seal`].
///
/// # Errors
///
/// Returns [`CredentialError::Malformed`] when the data is too short to hold
/// a nonce and tag, or [`CredentialError::Decrypt`] when authentication
/// fails (wrong key or tampered data).
pub fn open(key: &EncryptionKey, sealed: &[u8]) -> Result<Vec<u8>, CredentialError> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CredentialError::Malformed);
    }
    let (nonce, ciphertext) = sealed
        .split_at_checked(NONCE_SIZE)
        .ok_or(CredentialError::Malformed)?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|err| CredentialError::Decrypt(err.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|err| CredentialError::Decrypt(err.to_string()))
}

/// Derives the per-session wrapping key as `SHA-256(session_token || owner)`.
///
/// The owner is mixed in as its hyphenated UUID text.
#[must_use]
pub fn derive_session_key(session_token: &str, owner: OwnerId) -> EncryptionKey {
    let mut hasher = Sha256::new();
    hasher.update(session_token.as_bytes());
    hasher.update(owner.into_inner().hyphenated().to_string().as_bytes());
    EncryptionKey::from_bytes(hasher.finalize().into())
}
