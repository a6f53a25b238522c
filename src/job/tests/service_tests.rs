//! Service tests for enqueue, claim, cancel, retry, and expiry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use crate::account::domain::AccountId;
use crate::client::domain::ClientId;
use crate::clock::ManualClock;
use crate::config::JobQueueConfig;
use crate::error::{Classify, ErrorKind};
use crate::job::{
    adapters::memory::InMemoryJobRepository,
    domain::{JobDomainError, JobFailure, JobId, JobPayload, JobStatus, JobType},
    ports::{ClaimEligibility, EligibilityError, JobRepository},
    services::{EnqueueJobRequest, JobQueueError, JobQueueService},
};
use crate::owner::OwnerId;
use crate::platform::Platform;
use crate::workflow::{
    adapters::memory::InMemoryWorkflowRepository,
    domain::{
        MicroActionId, NewWorkflow, Workflow, WorkflowId, WorkflowKind, WorkflowName, WorkflowStep,
    },
    ports::WorkflowRepository,
};

type TestQueue = JobQueueService<InMemoryJobRepository, ManualClock>;

/// Eligibility gate with a fixed answer.
struct FixedEligibility {
    live: bool,
}

#[async_trait]
impl ClaimEligibility for FixedEligibility {
    async fn ensure_eligible(&self, client_id: &ClientId) -> Result<(), EligibilityError> {
        if self.live {
            return Ok(());
        }
        Err(EligibilityError::Stale {
            client_id: client_id.clone(),
            last_heartbeat: None,
        })
    }
}

struct Harness {
    queue: TestQueue,
    jobs: Arc<InMemoryJobRepository>,
    clock: ManualClock,
    workflows: Arc<InMemoryWorkflowRepository>,
    post_workflow: WorkflowId,
    owner: OwnerId,
}

impl Harness {
    fn payload(&self) -> JobPayload {
        JobPayload::new(self.post_workflow, AccountId::new(), client())
            .with_param("text", "hello")
    }

    async fn enqueue(&self) -> crate::job::domain::Job {
        self.queue
            .enqueue(
                self.owner,
                EnqueueJobRequest::new(JobType::Post, self.payload()),
            )
            .await
            .expect("enqueue should succeed")
    }
}

fn client() -> ClientId {
    ClientId::new("desk-01").expect("valid client id")
}

async fn store_workflow(
    repo: &InMemoryWorkflowRepository,
    clock: &ManualClock,
    name: &str,
    kind: WorkflowKind,
) -> Workflow {
    let workflow = Workflow::new(
        NewWorkflow {
            name: WorkflowName::new(name).expect("valid name"),
            platform: Platform::Twitter,
            kind,
            steps: vec![WorkflowStep::new(MicroActionId::new())],
            requires_auth: false,
            auth_workflow_id: None,
        },
        clock,
    )
    .expect("valid workflow");
    repo.store(&workflow).await.expect("store workflow");
    workflow
}

async fn harness_with(live: bool) -> Harness {
    let clock =
        ManualClock::at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid instant"));
    let workflows = Arc::new(InMemoryWorkflowRepository::new());
    let post = store_workflow(&workflows, &clock, "post", WorkflowKind::Action).await;
    let jobs = Arc::new(InMemoryJobRepository::new());
    let queue = JobQueueService::new(
        jobs.clone(),
        workflows.clone(),
        Arc::new(FixedEligibility { live }),
        Arc::new(clock.clone()),
        JobQueueConfig::default(),
    );
    Harness {
        queue,
        jobs,
        clock,
        workflows,
        post_workflow: post.id(),
        owner: OwnerId::new(),
    }
}

#[fixture]
async fn harness() -> Harness {
    harness_with(true).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_have_exactly_one_winner(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;
    let queue = Arc::new(harness.queue.clone());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.claim(&client()).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        let claimed = handle
            .await
            .expect("claim task should not panic")
            .expect("claim should not error");
        if let Some(claimed) = claimed {
            assert_eq!(claimed.id(), job.id());
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let stored = queue
        .get(harness.owner, job.id())
        .await
        .expect("job should exist");
    assert_eq!(stored.status(), JobStatus::Processing);
    assert_eq!(stored.claimed_by(), Some(&client()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_succeeds_once_from_queued(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;

    let cancelled = harness
        .queue
        .cancel(harness.owner, job.id())
        .await
        .expect("cancel should succeed");
    assert_eq!(cancelled.status(), JobStatus::Cancelled);

    let second = harness.queue.cancel(harness.owner, job.id()).await;
    assert_eq!(second.err().map(|e| e.kind()), Some(ErrorKind::InvalidState));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_succeeds_from_processing(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;
    harness.queue.claim(&client()).await.expect("claim");

    let cancelled = harness
        .queue
        .cancel(harness.owner, job.id())
        .await
        .expect("cancel should succeed");
    assert_eq!(cancelled.status(), JobStatus::Cancelled);

    let late = harness.queue.complete(job.id(), &client(), None).await;
    assert_eq!(late.err().map(|e| e.kind()), Some(ErrorKind::InvalidState));
}

/// Terminal states a job can reach before a cancel request arrives.
#[derive(Debug, Clone, Copy)]
enum Finish {
    Completed,
    RetriesSpent,
    Expired,
    Cancelled,
}

async fn finish_job(harness: &Harness, finish: Finish) -> JobId {
    let job = harness
        .queue
        .enqueue(
            harness.owner,
            EnqueueJobRequest::new(JobType::Post, harness.payload()).max_retries(0),
        )
        .await
        .expect("enqueue should succeed");
    match finish {
        Finish::Completed => {
            harness.queue.claim(&client()).await.expect("claim");
            harness
                .queue
                .complete(job.id(), &client(), None)
                .await
                .expect("complete should succeed");
        }
        Finish::RetriesSpent => {
            harness.queue.claim(&client()).await.expect("claim");
            let failure = JobFailure::new(ErrorKind::UpstreamPlatform, "timeline did not load");
            let failed = harness
                .queue
                .fail(job.id(), &client(), failure)
                .await
                .expect("fail should succeed");
            assert_eq!(failed.status(), JobStatus::Failed);
        }
        Finish::Expired => {
            harness.clock.advance(Duration::hours(25));
            harness.queue.sweep_expired().await.expect("sweep");
        }
        Finish::Cancelled => {
            harness
                .queue
                .cancel(harness.owner, job.id())
                .await
                .expect("cancel should succeed");
        }
    }
    job.id()
}

#[rstest]
#[case::completed(Finish::Completed, JobStatus::Completed)]
#[case::retries_spent(Finish::RetriesSpent, JobStatus::Failed)]
#[case::expired(Finish::Expired, JobStatus::Failed)]
#[case::cancelled(Finish::Cancelled, JobStatus::Cancelled)]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_rejects_terminal_jobs(
    #[future] harness: Harness,
    #[case] finish: Finish,
    #[case] terminal: JobStatus,
) {
    let harness = harness.await;
    let id = finish_job(&harness, finish).await;

    let result = harness.queue.cancel(harness.owner, id).await;
    let err = result.expect_err("terminal jobs cannot be cancelled");
    assert!(matches!(
        err,
        JobQueueError::Domain(JobDomainError::InvalidStateTransition { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let stored = harness.queue.get(harness.owner, id).await.expect("get");
    assert_eq!(stored.status(), terminal);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_claim_cannot_overwrite_a_requeued_job(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;
    let mut stale = harness
        .jobs
        .find_by_id(job.id())
        .await
        .expect("lookup")
        .expect("job should exist");

    harness.queue.claim(&client()).await.expect("claim");
    let failure = JobFailure::new(ErrorKind::UpstreamPlatform, "compose box missing");
    let requeued = harness
        .queue
        .fail(job.id(), &client(), failure.clone())
        .await
        .expect("fail should succeed");
    assert_eq!(requeued.status(), JobStatus::Queued);

    stale
        .claim(client(), &harness.clock)
        .expect("queued copy can be claimed");
    let written = harness
        .jobs
        .transition(&stale, JobStatus::Queued)
        .await
        .expect("transition should not error");
    assert!(!written);

    let stored = harness
        .jobs
        .find_by_id(job.id())
        .await
        .expect("lookup")
        .expect("job should exist");
    assert_eq!(stored.status(), JobStatus::Queued);
    assert_eq!(stored.retry_count(), 1);
    assert_eq!(stored.last_error(), Some(&failure));
    assert_eq!(stored, requeued);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn other_owners_see_not_found(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;

    let stranger = OwnerId::new();
    let read = harness.queue.get(stranger, job.id()).await;
    assert!(matches!(read, Err(JobQueueError::NotFound(id)) if id == job.id()));
    let cancel = harness.queue.cancel(stranger, job.id()).await;
    assert_eq!(cancel.err().map(|e| e.kind()), Some(ErrorKind::NotFound));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn enqueue_validates_workflow_reference(#[future] harness: Harness) {
    let harness = harness.await;

    let unknown = JobPayload::new(WorkflowId::new(), AccountId::new(), client());
    let result = harness
        .queue
        .enqueue(harness.owner, EnqueueJobRequest::new(JobType::Post, unknown))
        .await;
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let mismatch = harness
        .queue
        .enqueue(
            harness.owner,
            EnqueueJobRequest::new(JobType::Auth, harness.payload()),
        )
        .await;
    assert!(matches!(
        mismatch,
        Err(JobQueueError::WorkflowTypeMismatch {
            job_type: JobType::Auth,
            ..
        })
    ));

    let mut inactive =
        store_workflow(&harness.workflows, &harness.clock, "follow", WorkflowKind::Action).await;
    inactive.deactivate(&harness.clock);
    harness
        .workflows
        .update(&inactive)
        .await
        .expect("update workflow");
    let payload = JobPayload::new(inactive.id(), AccountId::new(), client());
    let result = harness
        .queue
        .enqueue(harness.owner, EnqueueJobRequest::new(JobType::Follow, payload))
        .await;
    assert!(matches!(result, Err(JobQueueError::InactiveWorkflow(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn enqueue_applies_defaults(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;
    assert_eq!(job.status(), JobStatus::Queued);
    assert_eq!(job.max_retries(), 3);
    assert_eq!(job.retry_count(), 0);
    assert_eq!(
        job.expires_at(),
        Some(harness.clock.utc() + Duration::hours(24))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claim_waits_for_schedule(#[future] harness: Harness) {
    let harness = harness.await;
    let start = harness.clock.utc() + Duration::minutes(10);
    let job = harness
        .queue
        .enqueue(
            harness.owner,
            EnqueueJobRequest::new(JobType::Post, harness.payload()).scheduled_for(start),
        )
        .await
        .expect("enqueue should succeed");

    assert!(harness.queue.claim(&client()).await.expect("claim").is_none());
    harness.clock.advance(Duration::minutes(10));
    let claimed = harness.queue.claim(&client()).await.expect("claim");
    assert_eq!(claimed.map(|j| j.id()), Some(job.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claim_ignores_jobs_for_other_clients(#[future] harness: Harness) {
    let harness = harness.await;
    harness.enqueue().await;
    let other = ClientId::new("desk-02").expect("valid client id");
    assert!(harness.queue.claim(&other).await.expect("claim").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_clients_cannot_claim() {
    let harness = harness_with(false).await;
    harness.enqueue().await;
    let result = harness.queue.claim(&client()).await;
    assert!(matches!(
        result,
        Err(JobQueueError::Ineligible(EligibilityError::Stale { .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retryable_failures_requeue_until_budget_is_spent(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness
        .queue
        .enqueue(
            harness.owner,
            EnqueueJobRequest::new(JobType::Post, harness.payload()).max_retries(1),
        )
        .await
        .expect("enqueue should succeed");

    harness.queue.claim(&client()).await.expect("claim");
    let failure = JobFailure::new(ErrorKind::UpstreamPlatform, "compose box missing");
    let requeued = harness
        .queue
        .fail(job.id(), &client(), failure.clone())
        .await
        .expect("fail should succeed");
    assert_eq!(requeued.status(), JobStatus::Queued);
    assert_eq!(requeued.retry_count(), 1);

    harness.queue.claim(&client()).await.expect("claim");
    let terminal = harness
        .queue
        .fail(job.id(), &client(), failure)
        .await
        .expect("fail should succeed");
    assert_eq!(terminal.status(), JobStatus::Failed);
    assert_eq!(terminal.retry_count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reports_from_non_claimants_are_rejected(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;
    harness.queue.claim(&client()).await.expect("claim");

    let other = ClientId::new("desk-02").expect("valid client id");
    let result = harness.queue.complete(job.id(), &other, None).await;
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Unauthorized));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_expires_overdue_jobs_lazily(#[future] harness: Harness) {
    let harness = harness.await;
    let job = harness.enqueue().await;
    harness.clock.advance(Duration::hours(25));

    let read = harness
        .queue
        .get(harness.owner, job.id())
        .await
        .expect("get should succeed");
    assert_eq!(read.status(), JobStatus::Failed);
    assert!(read.processed_at().is_some());
    assert!(harness.queue.claim(&client()).await.expect("claim").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweeper_fails_queued_and_processing_jobs_past_expiry(#[future] harness: Harness) {
    let harness = harness.await;
    let first = harness.enqueue().await;
    let second = harness.enqueue().await;
    harness.queue.claim(&client()).await.expect("claim");
    harness.clock.advance(Duration::hours(24));

    let expired = harness.queue.sweep_expired().await.expect("sweep");
    assert_eq!(expired, 2);
    for id in [first.id(), second.id()] {
        let job = harness.queue.get(harness.owner, id).await.expect("get");
        assert_eq!(job.status(), JobStatus::Failed);
    }
    assert_eq!(harness.queue.sweep_expired().await.expect("sweep"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_returns_newest_first(#[future] harness: Harness) {
    let harness = harness.await;
    let older = harness.enqueue().await;
    harness.clock.advance(Duration::seconds(5));
    let newer = harness.enqueue().await;

    let jobs = harness.queue.list(harness.owner).await.expect("list");
    let ids: Vec<_> = jobs.iter().map(|job| job.id()).collect();
    assert_eq!(ids, vec![newer.id(), older.id()]);
    assert!(
        harness
            .queue
            .list(OwnerId::new())
            .await
            .expect("list")
            .is_empty()
    );
}
