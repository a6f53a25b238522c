//! Ciphertext envelopes in `nonce || ciphertext || tag` layout.
//!
//! Each envelope is a distinct type so a key sealed for storage cannot be
//! handed to a client by mistake.

use super::CredentialError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! envelope {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Wraps raw ciphertext bytes.
            #[must_use]
            pub const fn from_bytes(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }

            /// Returns the raw ciphertext bytes.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Encodes the ciphertext as standard base64.
            #[must_use]
            pub fn to_base64(&self) -> String {
                STANDARD.encode(&self.0)
            }

            /// Decodes standard base64 ciphertext.
            ///
            /// # Errors
            ///
            /// Returns [`CredentialError::Malformed`] for invalid base64.
            pub fn from_base64(encoded: &str) -> Result<Self, CredentialError> {
                STANDARD
                    .decode(encoded.trim())
                    .map(Self)
                    .map_err(|_| CredentialError::Malformed)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base64())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let encoded = String::deserialize(deserializer)?;
                Self::from_base64(&encoded).map_err(serde::de::Error::custom)
            }
        }
    };
}

envelope!(
    /// A client key sealed under the server master key, as stored on the
    /// client record.
    SealedKey
);

envelope!(
    /// A client key wrapped under a session-derived key, as transported to a
    /// trusted device.
    WrappedKey
);

envelope!(
    /// An account secret encrypted under its client key.
    EncryptedSecret
);
