//! Credential encryption broker for Drover.
//!
//! Each client installation owns a symmetric key. The server stores that key
//! only sealed under its master key and hands it out re-wrapped under a key
//! derived from the requesting user's session, so the plaintext key exists
//! only on trusted devices. Account secrets are encrypted under the client
//! key before they reach the server.
//!
//! - Key, token, and envelope types in [`domain`]
//! - AES-256-GCM primitives in [`cipher`]
//! - The wrapping workflow in [`services`]

pub mod cipher;
pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
