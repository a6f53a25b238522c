//! Domain model for queued jobs.

mod error;
mod ids;
mod job;

pub use error::{JobDomainError, ParseJobValueError};
pub use ids::JobId;
pub use job::{
    FailureDisposition, Job, JobFailure, JobPayload, JobStatus, JobType, NewJob, PersistedJobData,
};
