//! Job queue service: enqueue, claim, report, cancel, and expiry.

use crate::client::domain::ClientId;
use crate::config::JobQueueConfig;
use crate::error::{Classify, ErrorKind};
use crate::job::{
    domain::{Job, JobDomainError, JobFailure, JobId, JobPayload, JobStatus, JobType, NewJob},
    ports::{ClaimEligibility, EligibilityError, JobRepository, JobRepositoryError},
};
use crate::owner::OwnerId;
use crate::workflow::{
    domain::{WorkflowId, WorkflowKind},
    ports::{WorkflowRepository, WorkflowRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Attempts made before a write that keeps losing races gives up.
const MAX_CAS_ATTEMPTS: usize = 3;

/// Request payload for enqueuing a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueJobRequest {
    job_type: JobType,
    payload: JobPayload,
    scheduled_for: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    max_retries: Option<u32>,
}

impl EnqueueJobRequest {
    /// Creates a request for immediate execution.
    #[must_use]
    pub const fn new(job_type: JobType, payload: JobPayload) -> Self {
        Self {
            job_type,
            payload,
            scheduled_for: None,
            expires_at: None,
            max_retries: None,
        }
    }

    /// Delays the earliest claim until `at`.
    #[must_use]
    pub const fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_for = Some(at);
        self
    }

    /// Overrides the default expiry.
    #[must_use]
    pub const fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Overrides the default retry budget.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// Service-level errors for job queue operations.
#[derive(Debug, Error)]
pub enum JobQueueError {
    /// A job state rule was violated.
    #[error(transparent)]
    Domain(#[from] JobDomainError),

    /// Job persistence failed.
    #[error(transparent)]
    Repository(#[from] JobRepositoryError),

    /// Workflow lookup failed.
    #[error(transparent)]
    WorkflowLookup(#[from] WorkflowRepositoryError),

    /// The client may not claim jobs right now.
    #[error(transparent)]
    Ineligible(#[from] EligibilityError),

    /// The job does not exist or belongs to another owner.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The payload references an unknown workflow.
    #[error("workflow not found: {0}")]
    UnknownWorkflow(WorkflowId),

    /// The payload references a deactivated workflow.
    #[error("workflow {0} is not active")]
    InactiveWorkflow(WorkflowId),

    /// Auth jobs must run auth workflows and other jobs must not.
    #[error("job type {job_type} cannot run workflow {workflow_id}")]
    WorkflowTypeMismatch {
        /// Requested job type.
        job_type: JobType,
        /// Referenced workflow.
        workflow_id: WorkflowId,
    },

    /// Concurrent writers kept changing the job.
    #[error("job {0} changed concurrently")]
    Conflict(JobId),
}

impl Classify for JobQueueError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(JobDomainError::InvalidStateTransition { .. }) | Self::Conflict(_) => {
                ErrorKind::InvalidState
            }
            Self::Domain(JobDomainError::ExpiryBeforeSchedule)
            | Self::UnknownWorkflow(_)
            | Self::InactiveWorkflow(_)
            | Self::WorkflowTypeMismatch { .. } => ErrorKind::Validation,
            Self::Domain(JobDomainError::NotClaimant { .. })
            | Self::Ineligible(EligibilityError::Unknown(_)) => ErrorKind::Unauthorized,
            Self::Ineligible(EligibilityError::Stale { .. }) => ErrorKind::InvalidState,
            Self::Repository(JobRepositoryError::NotFound(_)) | Self::NotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Repository(_) | Self::WorkflowLookup(_) | Self::Ineligible(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for job queue operations.
pub type JobQueueResult<T> = Result<T, JobQueueError>;

/// Job queue orchestration service.
pub struct JobQueueService<R, C>
where
    R: JobRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    workflows: Arc<dyn WorkflowRepository>,
    eligibility: Arc<dyn ClaimEligibility>,
    clock: Arc<C>,
    config: JobQueueConfig,
}

impl<R, C> Clone for JobQueueService<R, C>
where
    R: JobRepository + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            workflows: Arc::clone(&self.workflows),
            eligibility: Arc::clone(&self.eligibility),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<R, C> JobQueueService<R, C>
where
    R: JobRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new job queue service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        workflows: Arc<dyn WorkflowRepository>,
        eligibility: Arc<dyn ClaimEligibility>,
        clock: Arc<C>,
        config: JobQueueConfig,
    ) -> Self {
        Self {
            repository,
            workflows,
            eligibility,
            clock,
            config,
        }
    }

    /// Enqueues a job after validating its workflow reference.
    ///
    /// Without an explicit expiry the job expires one configured
    /// time-to-live after its scheduled start.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError`] when the workflow is unknown, inactive, or
    /// of the wrong kind, when the expiry is inconsistent, or when the
    /// repository rejects persistence.
    pub async fn enqueue(&self, owner: OwnerId, request: EnqueueJobRequest) -> JobQueueResult<Job> {
        self.check_workflow(request.job_type, request.payload.workflow_id)
            .await?;
        let start = request.scheduled_for.unwrap_or_else(|| self.clock.utc());
        let expires_at = request
            .expires_at
            .or_else(|| start.checked_add_signed(self.config.default_ttl()));
        let job = Job::enqueue(
            NewJob {
                owner,
                job_type: request.job_type,
                payload: request.payload,
                scheduled_for: request.scheduled_for,
                expires_at,
                max_retries: request.max_retries.unwrap_or(self.config.default_max_retries),
            },
            &*self.clock,
        )?;
        self.repository.store(&job).await?;
        tracing::info!(
            job_id = %job.id(),
            job_type = %job.job_type(),
            client_id = %job.payload().client_id,
            "enqueued job"
        );
        Ok(job)
    }

    /// Returns an owner's job, failing it first if it has expired.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::NotFound`] when the job is absent or owned by
    /// someone else.
    pub async fn get(&self, owner: OwnerId, id: JobId) -> JobQueueResult<Job> {
        let job = self.load_owned(owner, id).await?;
        self.expire_if_due(job).await
    }

    /// Lists an owner's jobs, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the lookup fails.
    pub async fn list(&self, owner: OwnerId) -> JobQueueResult<Vec<Job>> {
        Ok(self.repository.list_for_owner(owner).await?)
    }

    /// Cancels a queued or processing job.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Domain`] with an invalid transition when the
    /// job is already terminal, or [`JobQueueError::NotFound`] when it is
    /// absent or not owned.
    pub async fn cancel(&self, owner: OwnerId, id: JobId) -> JobQueueResult<Job> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut job = self.get(owner, id).await?;
            let observed = job.status();
            job.cancel(&*self.clock)?;
            if self.repository.transition(&job, observed).await? {
                job.advance_version();
                tracing::info!(job_id = %id, from = %observed, "cancelled job");
                return Ok(job);
            }
        }
        Err(JobQueueError::Conflict(id))
    }

    /// Claims the next claimable job addressed to `client_id`.
    ///
    /// Returns `Ok(None)` when nothing is claimable or every candidate was
    /// taken by a concurrent caller. Candidates found past their expiry are
    /// failed on the way.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Ineligible`] when the client is unknown or
    /// stale, or [`JobQueueError::Repository`] when persistence fails.
    pub async fn claim(&self, client_id: &ClientId) -> JobQueueResult<Option<Job>> {
        self.eligibility.ensure_eligible(client_id).await?;
        let now = self.clock.utc();
        let candidates = self
            .repository
            .list_claimable(client_id, now, self.config.claim_batch_size)
            .await?;
        for mut job in candidates {
            if job.is_expired_at(now) {
                self.expire_if_due(job).await?;
                continue;
            }
            job.claim(client_id.clone(), &*self.clock)?;
            if self.repository.transition(&job, JobStatus::Queued).await? {
                job.advance_version();
                tracing::info!(job_id = %job.id(), client_id = %client_id, "claimed job");
                return Ok(Some(job));
            }
            tracing::debug!(job_id = %job.id(), client_id = %client_id, "lost claim race");
        }
        Ok(None)
    }

    /// Marks a job the client holds as completed.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Domain`] when the client is not the claimant
    /// or the job is no longer processing.
    pub async fn complete(
        &self,
        id: JobId,
        client_id: &ClientId,
        result: Option<Value>,
    ) -> JobQueueResult<Job> {
        let mut job = self.load_current(id).await?;
        job.ensure_claimant(client_id)?;
        job.complete(result, &*self.clock)?;
        if !self
            .repository
            .transition(&job, JobStatus::Processing)
            .await?
        {
            return Err(JobQueueError::Conflict(id));
        }
        job.advance_version();
        tracing::info!(job_id = %id, client_id = %client_id, "completed job");
        Ok(job)
    }

    /// Records a failure for a job the client holds.
    ///
    /// The returned job is `queued` again when a retry was spent and
    /// `failed` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Domain`] when the client is not the claimant
    /// or the job is no longer processing.
    pub async fn fail(
        &self,
        id: JobId,
        client_id: &ClientId,
        failure: JobFailure,
    ) -> JobQueueResult<Job> {
        let mut job = self.load_current(id).await?;
        job.ensure_claimant(client_id)?;
        let kind = failure.kind;
        let disposition = job.fail(failure, &*self.clock)?;
        if !self
            .repository
            .transition(&job, JobStatus::Processing)
            .await?
        {
            return Err(JobQueueError::Conflict(id));
        }
        job.advance_version();
        tracing::warn!(
            job_id = %id,
            client_id = %client_id,
            kind = %kind,
            disposition = ?disposition,
            "job failed"
        );
        Ok(job)
    }

    /// Fails every unfinished job at or past its expiry.
    ///
    /// Returns the number of jobs this call expired. Jobs another writer
    /// moved in the meantime are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when persistence fails.
    pub async fn sweep_expired(&self) -> JobQueueResult<usize> {
        let now = self.clock.utc();
        let mut expired = 0;
        for mut job in self.repository.list_expired(now).await? {
            let observed = job.status();
            job.expire(&*self.clock)?;
            if self.repository.transition(&job, observed).await? {
                tracing::info!(job_id = %job.id(), from = %observed, "expired job");
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn check_workflow(&self, job_type: JobType, id: WorkflowId) -> JobQueueResult<()> {
        let workflow = self
            .workflows
            .find_by_id(id)
            .await?
            .ok_or(JobQueueError::UnknownWorkflow(id))?;
        if !workflow.is_active() {
            return Err(JobQueueError::InactiveWorkflow(id));
        }
        let wants_auth = job_type == JobType::Auth;
        if wants_auth != (workflow.kind() == WorkflowKind::Auth) {
            return Err(JobQueueError::WorkflowTypeMismatch {
                job_type,
                workflow_id: id,
            });
        }
        Ok(())
    }

    async fn load_owned(&self, owner: OwnerId, id: JobId) -> JobQueueResult<Job> {
        self.repository
            .find_by_id(id)
            .await?
            .filter(|job| job.owner() == owner)
            .ok_or(JobQueueError::NotFound(id))
    }

    async fn load_current(&self, id: JobId) -> JobQueueResult<Job> {
        let job = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(JobQueueError::NotFound(id))?;
        self.expire_if_due(job).await
    }

    /// Applies the lazy expiry check and returns the job as stored afterwards.
    async fn expire_if_due(&self, mut job: Job) -> JobQueueResult<Job> {
        if !job.is_expired_at(self.clock.utc()) {
            return Ok(job);
        }
        let observed = job.status();
        let id = job.id();
        job.expire(&*self.clock)?;
        if self.repository.transition(&job, observed).await? {
            job.advance_version();
            tracing::info!(job_id = %id, from = %observed, "expired job");
            return Ok(job);
        }
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(JobQueueError::NotFound(id))
    }
}
