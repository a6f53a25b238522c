//! In-memory job repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::domain::ClientId;
use crate::job::{
    domain::{Job, JobId, JobStatus},
    ports::{JobRepository, JobRepositoryError, JobRepositoryResult},
};
use crate::owner::OwnerId;

/// Thread-safe in-memory job repository.
///
/// Conditional transitions hold the write lock across the status check and
/// the write, so concurrent claimants observe a single winner.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobRepository {
    state: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl InMemoryJobRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> JobRepositoryError {
    JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn store(&self, job: &Job) -> JobRepositoryResult<()> {
        let mut jobs = self.state.write().map_err(lock_error)?;
        if jobs.contains_key(&job.id()) {
            return Err(JobRepositoryError::DuplicateJob(job.id()));
        }
        jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn transition(&self, job: &Job, expected: JobStatus) -> JobRepositoryResult<bool> {
        let mut jobs = self.state.write().map_err(lock_error)?;
        let Some(current) = jobs.get_mut(&job.id()) else {
            return Err(JobRepositoryError::NotFound(job.id()));
        };
        if current.status() != expected || current.version() != job.version() {
            return Ok(false);
        }
        let mut next = job.clone();
        next.advance_version();
        *current = next;
        Ok(true)
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        let jobs = self.state.read().map_err(lock_error)?;
        Ok(jobs.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner: OwnerId) -> JobRepositoryResult<Vec<Job>> {
        let jobs = self.state.read().map_err(lock_error)?;
        let mut owned: Vec<Job> = jobs
            .values()
            .filter(|job| job.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|job| Reverse(job.created_at()));
        Ok(owned)
    }

    async fn list_claimable(
        &self,
        client_id: &ClientId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> JobRepositoryResult<Vec<Job>> {
        let jobs = self.state.read().map_err(lock_error)?;
        let mut candidates: Vec<Job> = jobs
            .values()
            .filter(|job| job.status() == JobStatus::Queued)
            .filter(|job| &job.payload().client_id == client_id)
            .filter(|job| job.scheduled_for().is_none_or(|start| start <= now))
            .cloned()
            .collect();
        candidates.sort_by_key(|job| (job.scheduled_for().unwrap_or(job.created_at()), job.id()));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> JobRepositoryResult<Vec<Job>> {
        let jobs = self.state.read().map_err(lock_error)?;
        let mut expired: Vec<Job> = jobs
            .values()
            .filter(|job| job.is_expired_at(now))
            .cloned()
            .collect();
        expired.sort_by_key(Job::created_at);
        Ok(expired)
    }
}
