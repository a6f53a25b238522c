//! Diesel row models for job persistence.

use super::schema::jobs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for job records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Job type.
    pub job_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Payload JSON.
    pub payload: Value,
    /// Addressed client.
    pub client_id: String,
    /// Retries spent.
    pub retry_count: i32,
    /// Retry budget.
    pub max_retries: i32,
    /// Earliest claim time.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Finish time.
    pub processed_at: Option<DateTime<Utc>>,
    /// Current or last claimant.
    pub claimed_by: Option<String>,
    /// Completion result.
    pub result: Option<Value>,
    /// Most recent failure.
    pub last_error: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Conditional write counter.
    pub version: i64,
}

/// Insert and update model for job records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = jobs)]
#[diesel(treat_none_as_null = true)]
pub struct JobWriteRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Job type.
    pub job_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Payload JSON.
    pub payload: Value,
    /// Addressed client.
    pub client_id: String,
    /// Retries spent.
    pub retry_count: i32,
    /// Retry budget.
    pub max_retries: i32,
    /// Earliest claim time.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Finish time.
    pub processed_at: Option<DateTime<Utc>>,
    /// Current or last claimant.
    pub claimed_by: Option<String>,
    /// Completion result.
    pub result: Option<Value>,
    /// Most recent failure.
    pub last_error: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Conditional write counter.
    pub version: i64,
}
