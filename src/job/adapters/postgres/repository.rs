//! `PostgreSQL` repository implementation for job storage.

use super::{
    models::{JobRow, JobWriteRow},
    schema::jobs,
};
use crate::client::domain::ClientId;
use crate::job::{
    domain::{Job, JobId, JobPayload, JobStatus, JobType, PersistedJobData},
    ports::{JobRepository, JobRepositoryError, JobRepositoryResult},
};
use crate::owner::OwnerId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by job adapters.
pub type JobPgPool = Pool<ConnectionManager<PgConnection>>;

const UNFINISHED: [&str; 2] = ["queued", "processing"];

/// `PostgreSQL`-backed job repository.
///
/// Transitions are single `UPDATE ... WHERE id = $1 AND status = $2 AND
/// version = $3` statements, so the database arbitrates concurrent claims.
#[derive(Debug, Clone)]
pub struct PostgresJobRepository {
    pool: JobPgPool,
}

impl PostgresJobRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: JobPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> JobRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> JobRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(JobRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(JobRepositoryError::persistence)?
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn store(&self, job: &Job) -> JobRepositoryResult<()> {
        let job_id = job.id();
        let row = to_write_row(job)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(jobs::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        JobRepositoryError::DuplicateJob(job_id)
                    }
                    _ => JobRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn transition(&self, job: &Job, expected: JobStatus) -> JobRepositoryResult<bool> {
        let job_id = job.id();
        let observed = i64::try_from(job.version()).map_err(JobRepositoryError::persistence)?;
        let mut next = job.clone();
        next.advance_version();
        let row = to_write_row(&next)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                jobs::table
                    .filter(jobs::id.eq(job_id.into_inner()))
                    .filter(jobs::status.eq(expected.as_str()))
                    .filter(jobs::version.eq(observed)),
            )
            .set(&row)
            .execute(connection)
            .map_err(JobRepositoryError::persistence)?;
            if updated == 1 {
                return Ok(true);
            }
            let exists = diesel::select(diesel::dsl::exists(
                jobs::table.filter(jobs::id.eq(job_id.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(JobRepositoryError::persistence)?;
            if exists {
                Ok(false)
            } else {
                Err(JobRepositoryError::NotFound(job_id))
            }
        })
        .await
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        self.run_blocking(move |connection| {
            let row = jobs::table
                .filter(jobs::id.eq(id.into_inner()))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(JobRepositoryError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn list_for_owner(&self, owner: OwnerId) -> JobRepositoryResult<Vec<Job>> {
        self.run_blocking(move |connection| {
            let rows = jobs::table
                .filter(jobs::owner_id.eq(owner.into_inner()))
                .order(jobs::created_at.desc())
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }

    async fn list_claimable(
        &self,
        client_id: &ClientId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> JobRepositoryResult<Vec<Job>> {
        let client = client_id.as_str().to_owned();
        let limit = i64::try_from(limit).map_err(JobRepositoryError::persistence)?;
        self.run_blocking(move |connection| {
            let rows = jobs::table
                .filter(jobs::status.eq(JobStatus::Queued.as_str()))
                .filter(jobs::client_id.eq(client))
                .filter(jobs::scheduled_for.is_null().or(jobs::scheduled_for.le(now)))
                .order((jobs::scheduled_for.asc().nulls_first(), jobs::created_at.asc()))
                .limit(limit)
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> JobRepositoryResult<Vec<Job>> {
        self.run_blocking(move |connection| {
            let rows = jobs::table
                .filter(jobs::status.eq_any(UNFINISHED))
                .filter(jobs::expires_at.le(now))
                .order(jobs::created_at.asc())
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }
}

fn to_write_row(job: &Job) -> JobRepositoryResult<JobWriteRow> {
    let payload = serde_json::to_value(job.payload()).map_err(JobRepositoryError::persistence)?;
    let last_error = job
        .last_error()
        .map(serde_json::to_value)
        .transpose()
        .map_err(JobRepositoryError::persistence)?;
    Ok(JobWriteRow {
        id: job.id().into_inner(),
        owner_id: job.owner().into_inner(),
        job_type: job.job_type().as_str().to_owned(),
        status: job.status().as_str().to_owned(),
        payload,
        client_id: job.payload().client_id.as_str().to_owned(),
        retry_count: i32::try_from(job.retry_count()).map_err(JobRepositoryError::persistence)?,
        max_retries: i32::try_from(job.max_retries()).map_err(JobRepositoryError::persistence)?,
        scheduled_for: job.scheduled_for(),
        expires_at: job.expires_at(),
        processed_at: job.processed_at(),
        claimed_by: job.claimed_by().map(|client| client.as_str().to_owned()),
        result: job.result().cloned(),
        last_error,
        created_at: job.created_at(),
        updated_at: job.updated_at(),
        version: i64::try_from(job.version()).map_err(JobRepositoryError::persistence)?,
    })
}

fn row_to_job(row: JobRow) -> JobRepositoryResult<Job> {
    let payload = serde_json::from_value::<JobPayload>(row.payload)
        .map_err(JobRepositoryError::persistence)?;
    let last_error = row
        .last_error
        .map(serde_json::from_value)
        .transpose()
        .map_err(JobRepositoryError::persistence)?;
    let claimed_by = row
        .claimed_by
        .map(ClientId::new)
        .transpose()
        .map_err(JobRepositoryError::persistence)?;
    let data = PersistedJobData {
        id: JobId::from_uuid(row.id),
        owner: OwnerId::from_uuid(row.owner_id),
        job_type: JobType::try_from(row.job_type.as_str())
            .map_err(JobRepositoryError::persistence)?,
        status: JobStatus::try_from(row.status.as_str())
            .map_err(JobRepositoryError::persistence)?,
        payload,
        retry_count: u32::try_from(row.retry_count).map_err(JobRepositoryError::persistence)?,
        max_retries: u32::try_from(row.max_retries).map_err(JobRepositoryError::persistence)?,
        scheduled_for: row.scheduled_for,
        expires_at: row.expires_at,
        processed_at: row.processed_at,
        claimed_by,
        result: row.result,
        last_error,
        created_at: row.created_at,
        updated_at: row.updated_at,
        version: u64::try_from(row.version).map_err(JobRepositoryError::persistence)?,
    };
    Ok(Job::from_persisted(data))
}
