//! Repository port for job persistence.

use crate::client::domain::ClientId;
use crate::job::domain::{Job, JobId, JobStatus};
use crate::owner::OwnerId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for job repository operations.
pub type JobRepositoryResult<T> = Result<T, JobRepositoryError>;

/// Job persistence contract.
///
/// Jobs are never deleted. Every status change goes through
/// [`JobRepository::transition`], a conditional write that only succeeds
/// while the stored status still equals the status the caller observed and
/// the stored [`Job::version`] still equals the version the caller read.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Stores a new job.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::DuplicateJob`] when the identifier
    /// already exists.
    async fn store(&self, job: &Job) -> JobRepositoryResult<()>;

    /// Writes `job` if the stored copy is still in `expected` status at the
    /// same version as `job`. The stored copy's version is advanced by one.
    ///
    /// Returns `Ok(false)` when another writer got there first, including
    /// writes that left the status unchanged, such as a retry requeue.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist.
    async fn transition(&self, job: &Job, expected: JobStatus) -> JobRepositoryResult<bool>;

    /// Finds a job by identifier.
    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>>;

    /// Lists an owner's jobs, newest first.
    async fn list_for_owner(&self, owner: OwnerId) -> JobRepositoryResult<Vec<Job>>;

    /// Lists queued jobs addressed to `client_id` whose schedule has arrived,
    /// oldest schedule first.
    async fn list_claimable(
        &self,
        client_id: &ClientId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> JobRepositoryResult<Vec<Job>>;

    /// Lists queued or processing jobs at or past their expiry.
    async fn list_expired(&self, now: DateTime<Utc>) -> JobRepositoryResult<Vec<Job>>;
}

/// Errors returned by job repository implementations.
#[derive(Debug, Clone, Error)]
pub enum JobRepositoryError {
    /// A job with the same identifier already exists.
    #[error("duplicate job identifier: {0}")]
    DuplicateJob(JobId),

    /// The job was not found.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// Persistence failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl JobRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
