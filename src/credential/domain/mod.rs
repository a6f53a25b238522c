//! Key material, session tokens, and ciphertext envelopes.

mod envelope;
mod error;
mod key;
mod session;

pub use envelope::{EncryptedSecret, SealedKey, WrappedKey};
pub use error::CredentialError;
pub use key::EncryptionKey;
pub use session::{SessionFingerprint, SessionToken};
