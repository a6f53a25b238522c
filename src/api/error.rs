//! Boundary errors.

use crate::error::{Classify, ErrorKind};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for facade calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure as reported to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{status} {kind}: {message}")]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Error category.
    pub kind: ErrorKind,
    /// User-visible message.
    pub message: String,
}

impl ApiError {
    /// Creates an error of `kind` with its standard status.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status_code(),
            kind,
            message: message.into(),
        }
    }

    /// Rejects a request without valid credentials.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Unauthorized")
    }

    /// Rejects a malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Converts a classified service error.
    ///
    /// Internal and upstream failures get a generic message; their detail
    /// is logged instead.
    pub fn from_service<E: Classify + fmt::Display>(err: &E) -> Self {
        let kind = err.kind();
        match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %err, "internal error");
                Self::new(kind, "Internal error")
            }
            ErrorKind::UpstreamPlatform => {
                tracing::warn!(error = %err, "upstream platform error");
                Self::new(kind, "Platform error")
            }
            _ => Self::new(kind, err.to_string()),
        }
    }

    /// Replaces the message while keeping the kind and status.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
