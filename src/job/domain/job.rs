//! Job aggregate root and lifecycle types.

use super::{JobDomainError, JobId, ParseJobValueError};
use crate::account::domain::AccountId;
use crate::client::domain::ClientId;
use crate::error::ErrorKind;
use crate::owner::OwnerId;
use crate::workflow::domain::WorkflowId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a client to claim it.
    Queued,
    /// Claimed by exactly one client.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully with no retries left, or expired.
    Failed,
    /// Cancelled by the owner.
    Cancelled,
}

impl JobStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns whether a transition from `self` to `target` is permitted.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Queued, Self::Processing | Self::Cancelled | Self::Failed)
                | (
                    Self::Processing,
                    Self::Completed | Self::Failed | Self::Queued | Self::Cancelled
                )
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseJobValueError {
                field: "status",
                value: value.to_owned(),
            }),
        }
    }
}

/// Kind of work a job asks for.
///
/// The type names the canonical workflow the agent runs, so `Post` resolves
/// the platform's active `post` workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Log in and verify an account.
    Auth,
    /// Publish a post.
    Post,
    /// React to or like a post.
    React,
    /// Reply to a post.
    Reply,
    /// Follow a profile.
    Follow,
    /// Repost another post.
    Retweet,
}

impl JobType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Post => "post",
            Self::React => "react",
            Self::Reply => "reply",
            Self::Follow => "follow",
            Self::Retweet => "retweet",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobType {
    type Error = ParseJobValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "post" => Ok(Self::Post),
            "react" => Ok(Self::React),
            "reply" => Ok(Self::Reply),
            "follow" => Ok(Self::Follow),
            "retweet" => Ok(Self::Retweet),
            _ => Err(ParseJobValueError {
                field: "job_type",
                value: value.to_owned(),
            }),
        }
    }
}

/// What the job runs, for whom, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Workflow to execute.
    pub workflow_id: WorkflowId,
    /// Account the workflow acts as.
    pub account_id: AccountId,
    /// The only client allowed to claim this job.
    pub client_id: ClientId,
    /// Values rendered into step parameter templates.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl JobPayload {
    /// Creates a payload with no parameters.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, account_id: AccountId, client_id: ClientId) -> Self {
        Self {
            workflow_id,
            account_id,
            client_id,
            params: Map::new(),
        }
    }

    /// Adds one template parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Structured failure reported for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Error category deciding whether a retry is spent.
    pub kind: ErrorKind,
    /// Sanitized description.
    pub message: String,
}

impl JobFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn expired() -> Self {
        Self::new(ErrorKind::InvalidState, "job expired before completion")
    }
}

/// What happened to a job after a failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// The job went back to the queue.
    Requeued {
        /// Retry count after the increment.
        retry_count: u32,
    },
    /// The job is now terminally failed.
    Terminal,
}

/// Input for enqueuing a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    /// Owner of the job.
    pub owner: OwnerId,
    /// Kind of work.
    pub job_type: JobType,
    /// Workflow, account, and client references.
    pub payload: JobPayload,
    /// Earliest time the job may be claimed.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Time after which the job fails if still unfinished.
    pub expires_at: Option<DateTime<Utc>>,
    /// Retry budget for transient failures.
    pub max_retries: u32,
}

/// Parameter object for reconstructing a persisted job.
#[derive(Debug, Clone)]
pub struct PersistedJobData {
    /// Persisted identifier.
    pub id: JobId,
    /// Persisted owner.
    pub owner: OwnerId,
    /// Persisted job type.
    pub job_type: JobType,
    /// Persisted status.
    pub status: JobStatus,
    /// Persisted payload.
    pub payload: JobPayload,
    /// Persisted retry count.
    pub retry_count: u32,
    /// Persisted retry budget.
    pub max_retries: u32,
    /// Persisted schedule.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Persisted expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Persisted finish time.
    pub processed_at: Option<DateTime<Utc>>,
    /// Persisted claimant.
    pub claimed_by: Option<ClientId>,
    /// Persisted result.
    pub result: Option<Value>,
    /// Persisted last failure.
    pub last_error: Option<JobFailure>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted write counter.
    pub version: u64,
}

/// Job aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    owner: OwnerId,
    job_type: JobType,
    status: JobStatus,
    payload: JobPayload,
    retry_count: u32,
    max_retries: u32,
    scheduled_for: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    processed_at: Option<DateTime<Utc>>,
    claimed_by: Option<ClientId>,
    result: Option<Value>,
    last_error: Option<JobFailure>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Job {
    /// Creates a queued job.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::ExpiryBeforeSchedule`] when `expires_at` is
    /// not later than the scheduled start (or now, when unscheduled).
    pub fn enqueue(data: NewJob, clock: &impl Clock) -> Result<Self, JobDomainError> {
        let now = clock.utc();
        let start = data.scheduled_for.unwrap_or(now);
        if data.expires_at.is_some_and(|expiry| expiry <= start) {
            return Err(JobDomainError::ExpiryBeforeSchedule);
        }
        Ok(Self {
            id: JobId::new(),
            owner: data.owner,
            job_type: data.job_type,
            status: JobStatus::Queued,
            payload: data.payload,
            retry_count: 0,
            max_retries: data.max_retries,
            scheduled_for: data.scheduled_for,
            expires_at: data.expires_at,
            processed_at: None,
            claimed_by: None,
            result: None,
            last_error: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            owner: data.owner,
            job_type: data.job_type,
            status: data.status,
            payload: data.payload,
            retry_count: data.retry_count,
            max_retries: data.max_retries,
            scheduled_for: data.scheduled_for,
            expires_at: data.expires_at,
            processed_at: data.processed_at,
            claimed_by: data.claimed_by,
            result: data.result,
            last_error: data.last_error,
            created_at: data.created_at,
            updated_at: data.updated_at,
            version: data.version,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the owner.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the job type.
    #[must_use]
    pub const fn job_type(&self) -> JobType {
        self.job_type
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &JobPayload {
        &self.payload
    }

    /// Returns how many retries have been spent.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the retry budget.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the earliest claim time.
    #[must_use]
    pub const fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        self.scheduled_for
    }

    /// Returns the expiry.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns when the job reached a finished state.
    #[must_use]
    pub const fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    /// Returns the client holding or last holding the claim.
    #[must_use]
    pub const fn claimed_by(&self) -> Option<&ClientId> {
        self.claimed_by.as_ref()
    }

    /// Returns the completion result.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns the most recent failure.
    #[must_use]
    pub const fn last_error(&self) -> Option<&JobFailure> {
        self.last_error.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the number of conditional writes the stored copy has seen.
    ///
    /// Repositories compare this against the stored counter so a write
    /// built from a stale read is rejected even when the status matches.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Advances the write counter after a successful conditional write.
    pub const fn advance_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    /// Returns `true` when the job is unfinished at or past its expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.expires_at.is_some_and(|expiry| now >= expiry)
    }

    /// Returns `true` when a client may claim the job at `now`.
    #[must_use]
    pub fn is_claimable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Queued
            && self.scheduled_for.is_none_or(|start| start <= now)
            && !self.is_expired_at(now)
    }

    /// Moves a queued job to `processing` on behalf of `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStateTransition`] unless the job is
    /// queued.
    pub fn claim(&mut self, client_id: ClientId, clock: &impl Clock) -> Result<(), JobDomainError> {
        if self.status != JobStatus::Queued {
            return Err(self.transition_error(JobStatus::Processing));
        }
        self.status = JobStatus::Processing;
        self.claimed_by = Some(client_id);
        self.touch(clock);
        Ok(())
    }

    /// Verifies that `client_id` holds the claim.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::NotClaimant`] when another client (or none)
    /// holds the job.
    pub fn ensure_claimant(&self, client_id: &ClientId) -> Result<(), JobDomainError> {
        if self.claimed_by.as_ref() == Some(client_id) {
            return Ok(());
        }
        Err(JobDomainError::NotClaimant {
            job_id: self.id,
            client_id: client_id.clone(),
        })
    }

    /// Marks a processing job as completed.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStateTransition`] unless the job is
    /// processing.
    pub fn complete(
        &mut self,
        result: Option<Value>,
        clock: &impl Clock,
    ) -> Result<(), JobDomainError> {
        if self.status != JobStatus::Processing {
            return Err(self.transition_error(JobStatus::Completed));
        }
        self.status = JobStatus::Completed;
        self.result = result;
        self.processed_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    /// Records a failure for a processing job.
    ///
    /// Retryable failures requeue the job while `retry_count < max_retries`,
    /// incrementing the count; anything else fails the job terminally.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStateTransition`] unless the job is
    /// processing.
    pub fn fail(
        &mut self,
        failure: JobFailure,
        clock: &impl Clock,
    ) -> Result<FailureDisposition, JobDomainError> {
        if self.status != JobStatus::Processing {
            return Err(self.transition_error(JobStatus::Failed));
        }
        let retry = failure.kind.is_retryable() && self.retry_count < self.max_retries;
        self.last_error = Some(failure);
        let disposition = if retry {
            self.retry_count += 1;
            self.status = JobStatus::Queued;
            self.claimed_by = None;
            FailureDisposition::Requeued {
                retry_count: self.retry_count,
            }
        } else {
            self.status = JobStatus::Failed;
            self.processed_at = Some(clock.utc());
            FailureDisposition::Terminal
        };
        self.touch(clock);
        Ok(disposition)
    }

    /// Cancels a queued or processing job.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStateTransition`] when the job is
    /// already terminal.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), JobDomainError> {
        self.ensure_transition(JobStatus::Cancelled)?;
        self.status = JobStatus::Cancelled;
        self.touch(clock);
        Ok(())
    }

    /// Fails an unfinished job whose expiry has passed.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStateTransition`] when the job is
    /// already terminal.
    pub fn expire(&mut self, clock: &impl Clock) -> Result<(), JobDomainError> {
        self.ensure_transition(JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.last_error = Some(JobFailure::expired());
        self.processed_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    fn ensure_transition(&self, target: JobStatus) -> Result<(), JobDomainError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(self.transition_error(target))
        }
    }

    const fn transition_error(&self, to: JobStatus) -> JobDomainError {
        JobDomainError::InvalidStateTransition {
            job_id: self.id,
            from: self.status,
            to,
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
