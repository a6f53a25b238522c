//! Diesel schema for job persistence.

diesel::table! {
    /// Job records. Rows are never deleted.
    jobs (id) {
        /// Job identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// Job type.
        #[max_length = 32]
        job_type -> Varchar,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Workflow, account, client, and parameters.
        payload -> Jsonb,
        /// Client the job is addressed to, denormalized for claim lookups.
        #[max_length = 128]
        client_id -> Varchar,
        /// Retries spent.
        retry_count -> Int4,
        /// Retry budget.
        max_retries -> Int4,
        /// Earliest claim time.
        scheduled_for -> Nullable<Timestamptz>,
        /// Expiry.
        expires_at -> Nullable<Timestamptz>,
        /// Finish time.
        processed_at -> Nullable<Timestamptz>,
        /// Current or last claimant.
        #[max_length = 128]
        claimed_by -> Nullable<Varchar>,
        /// Completion result.
        result -> Nullable<Jsonb>,
        /// Most recent failure.
        last_error -> Nullable<Jsonb>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Conditional write counter.
        version -> Int8,
    }
}
