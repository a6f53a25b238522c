//! Error types for client validation and authentication.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by client construction and credential checks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientDomainError {
    /// The client identifier is empty, too long, or has invalid characters.
    #[error("invalid client id '{0}'")]
    InvalidClientId(String),

    /// The agent version string is empty.
    #[error("agent version must not be empty")]
    EmptyAgentVersion,

    /// The api token does not match the client.
    #[error("invalid client credentials")]
    TokenMismatch,

    /// The api token is past its expiry.
    #[error("api token expired at {expired_at}")]
    TokenExpired {
        /// When the token expired.
        expired_at: DateTime<Utc>,
    },

    /// An unknown client status string was supplied.
    #[error("unknown client status: {0}")]
    UnknownStatus(String),
}
