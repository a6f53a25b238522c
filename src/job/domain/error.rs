//! Error types for job domain validation and parsing.

use super::{JobId, JobStatus};
use crate::client::domain::ClientId;
use thiserror::Error;

/// Errors returned by job state transitions and construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobDomainError {
    /// The requested transition is not allowed from the current status.
    #[error("job {job_id} cannot move from {from} to {to}")]
    InvalidStateTransition {
        /// Job being transitioned.
        job_id: JobId,
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },

    /// The expiry does not fall after the scheduled start.
    #[error("job expiry must be later than its scheduled start")]
    ExpiryBeforeSchedule,

    /// A client reported on a job it does not hold.
    #[error("job {job_id} is not claimed by client {client_id}")]
    NotClaimant {
        /// Job the report was for.
        job_id: JobId,
        /// Reporting client.
        client_id: ClientId,
    },
}

/// Error returned while parsing job enums from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {field} value: {value}")]
pub struct ParseJobValueError {
    /// Field that failed to parse.
    pub field: &'static str,
    /// Raw value.
    pub value: String,
}
