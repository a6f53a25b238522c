//! Closed error taxonomy shared by every context.
//!
//! Each service error enum classifies itself into an [`ErrorKind`]. The
//! boundary in [`crate::api`] switches on the kind to pick a status code and a
//! user-visible message; it never inspects error text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of failure surfaced at the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, invalid, or expired credentials.
    Unauthorized,
    /// The resource is absent or not owned by the caller.
    NotFound,
    /// The operation is not allowed in the resource's current state.
    InvalidState,
    /// Input is missing or malformed.
    Validation,
    /// A step failed against the live platform.
    UpstreamPlatform,
    /// Encryption, storage, or other internal failure.
    Internal,
}

impl ErrorKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::Validation => "validation_error",
            Self::UpstreamPlatform => "upstream_platform_error",
            Self::Internal => "internal_error",
        }
    }

    /// HTTP status code the boundary reports for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::InvalidState | Self::Validation => 400,
            Self::UpstreamPlatform => 502,
            Self::Internal => 500,
        }
    }

    /// Whether a job failing with this kind may consume a retry.
    ///
    /// Input and authorization failures fail the same way on every attempt,
    /// so they end the job immediately.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::UpstreamPlatform | Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an error into the shared taxonomy.
pub trait Classify {
    /// Returns the error kind.
    fn kind(&self) -> ErrorKind;
}
