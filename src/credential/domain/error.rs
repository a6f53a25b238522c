//! Error types for key handling and encryption.

use thiserror::Error;

/// Errors returned by encryption, decryption, and key parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Authentication or decryption failed.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// The ciphertext is too short or badly encoded.
    #[error("encrypted data is malformed")]
    Malformed,

    /// Key material had the wrong length.
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// A decrypted secret was not valid UTF-8.
    #[error("decrypted secret is not valid UTF-8")]
    NotUtf8,
}
