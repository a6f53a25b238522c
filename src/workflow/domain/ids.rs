//! Identifier and validated scalar types for the workflow domain.

use super::WorkflowDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a workflow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(Uuid);

impl WorkflowId {
    /// Creates a new random workflow identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a workflow identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a micro-action catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MicroActionId(Uuid);

impl MicroActionId {
    /// Creates a new random micro-action identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a micro-action identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for MicroActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MicroActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical workflow name such as `auth`, `post`, or `follow`.
///
/// Agents look workflows up by `(platform, name)`, so names are normalized to
/// lowercase `[a-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowName(String);

impl WorkflowName {
    /// Creates a validated workflow name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyWorkflowName`] when the value is
    /// empty after trimming, or [`WorkflowDomainError::InvalidWorkflowName`]
    /// when it contains characters outside `[a-z0-9_]`.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkflowDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(WorkflowDomainError::EmptyWorkflowName);
        }
        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !is_valid {
            return Err(WorkflowDomainError::InvalidWorkflowName(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
