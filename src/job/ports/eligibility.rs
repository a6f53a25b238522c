//! Port deciding whether a client may claim new jobs.

use crate::client::domain::ClientId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Claim gate consulted before a client is handed a job.
///
/// Implemented by the client registry; the job queue only sees this trait.
#[async_trait]
pub trait ClaimEligibility: Send + Sync {
    /// Succeeds when `client_id` is registered and its heartbeat is fresh.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError`] describing why the client is refused.
    async fn ensure_eligible(&self, client_id: &ClientId) -> Result<(), EligibilityError>;
}

/// Reasons a client is refused new claims.
#[derive(Debug, Clone, Error)]
pub enum EligibilityError {
    /// No client with this identifier is registered.
    #[error("client {0} is not registered")]
    Unknown(ClientId),

    /// The client has not sent a heartbeat recently enough.
    #[error("client {client_id} is stale (last heartbeat {last_heartbeat:?})")]
    Stale {
        /// Refused client.
        client_id: ClientId,
        /// Most recent heartbeat, if any.
        last_heartbeat: Option<DateTime<Utc>>,
    },

    /// The registry lookup failed.
    #[error("eligibility lookup failed: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl EligibilityError {
    /// Wraps a lookup failure.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
