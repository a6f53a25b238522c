//! Orchestration services for the job queue.

mod queue;

pub use queue::{EnqueueJobRequest, JobQueueError, JobQueueResult, JobQueueService};
