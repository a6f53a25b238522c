//! Tests for the agent-facing coordinator port.

use super::harness::{CLIENT_ID, Harness, rejecting_page, twitter_page};
use crate::account::domain::{AccountStatus, AuthOutcome};
use crate::agent::domain::{AgentIdentity, ClientCredentials};
use crate::agent::ports::AgentCoordinator;
use crate::api::InstallClientBody;
use crate::client::domain::{ApiToken, ClientId, ClientStatus};
use crate::credential::domain::EncryptionKey;
use crate::error::{Classify, ErrorKind};
use crate::job::domain::{JobFailure, JobPayload, JobStatus, JobType};
use crate::job::services::EnqueueJobRequest;
use crate::platform::Platform;
use serde_json::{Map, json};

async fn second_client(harness: &Harness) -> ClientCredentials {
    let installed = harness
        .api
        .install_client(
            Some(&harness.user),
            InstallClientBody {
                client_id: "desktop-02".to_owned(),
                agent_version: "1.4.0".to_owned(),
                install_key: hex::encode(EncryptionKey::generate().as_bytes()),
            },
        )
        .await
        .expect("second install should succeed");
    ClientCredentials::new(
        ClientId::new(installed.client_id).expect("client id should be valid"),
        ApiToken::new(installed.api_token),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_tokens_cannot_claim() {
    let harness = Harness::new().await;
    let identity = harness.identity();
    let forged = ClientCredentials::new(
        identity.credentials.client_id.clone(),
        ApiToken::new("forged"),
    );

    let err = harness
        .api
        .claim(&forged)
        .await
        .expect_err("forged token should be refused");

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test(flavor = "multi_thread")]
async fn a_job_is_claimed_once() {
    let harness = Harness::new().await;
    harness
        .enqueue(JobType::Post, harness.post_workflow, Map::new())
        .await;
    let credentials = harness.identity().credentials;

    let first = harness.api.claim(&credentials).await.expect("claim should succeed");
    let second = harness.api.claim(&credentials).await.expect("claim should succeed");

    let job = first.expect("the queued job should be claimed");
    assert_eq!(job.status(), JobStatus::Processing);
    assert_eq!(job.claimed_by(), Some(&credentials.client_id));
    assert!(second.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn jobs_for_another_client_are_not_claimable() {
    let harness = Harness::new().await;
    harness
        .enqueue(JobType::Post, harness.post_workflow, Map::new())
        .await;
    let other = second_client(&harness).await;

    let claimed = harness.api.claim(&other).await.expect("claim should succeed");

    assert!(claimed.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn accounts_are_only_visible_to_their_client() {
    let harness = Harness::new().await;
    let other = second_client(&harness).await;
    let own = harness.identity().credentials;

    let visible = harness.api.account(&own, harness.account_id).await;
    let hidden = harness
        .api
        .account(&other, harness.account_id)
        .await
        .expect_err("foreign client should not see the account");

    assert_eq!(
        visible.map(|account| account.username().to_owned()).ok(),
        Some(super::harness::USERNAME.to_owned())
    );
    assert_eq!(hidden.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread")]
async fn only_the_claimant_completes_a_job() {
    let harness = Harness::new().await;
    harness
        .enqueue(JobType::Post, harness.post_workflow, Map::new())
        .await;
    let own = harness.identity().credentials;
    let other = second_client(&harness).await;
    let job = harness
        .api
        .claim(&own)
        .await
        .expect("claim should succeed")
        .expect("job should be claimed");

    let stolen = harness
        .api
        .complete(&other, job.id(), Some(json!({"ok": true})))
        .await;
    harness
        .api
        .complete(&own, job.id(), Some(json!({"ok": true})))
        .await
        .expect("claimant should complete");

    assert!(stolen.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn retryable_failures_requeue_until_retries_run_out() {
    let harness = Harness::new().await;
    let queued = harness
        .enqueue(JobType::Post, harness.post_workflow, Map::new())
        .await;
    let own = harness.identity().credentials;

    for _ in 0..=queued.max_retries {
        let job = harness
            .api
            .claim(&own)
            .await
            .expect("claim should succeed")
            .expect("job should be claimable again");
        harness
            .api
            .fail(
                &own,
                job.id(),
                JobFailure::new(ErrorKind::UpstreamPlatform, "platform timed out"),
            )
            .await
            .expect("failure should be recorded");
    }
    let current = harness
        .api
        .get_job(Some(&harness.user), queued.id)
        .await
        .expect("job should be readable");

    assert_eq!(current.status, JobStatus::Failed);
    assert_eq!(current.retry_count, queued.max_retries);
}

#[tokio::test(flavor = "multi_thread")]
async fn auth_outcomes_move_the_account() {
    let harness = Harness::new().await;
    let own = harness.identity().credentials;

    harness
        .api
        .record_auth_outcome(&own, harness.account_id, AuthOutcome::Verified)
        .await
        .expect("outcome should be recorded");
    let account = harness
        .api
        .account(&own, harness.account_id)
        .await
        .expect("account should be visible");

    assert_eq!(account.status(), AccountStatus::Active);
    assert!(account.last_verified_at().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn plans_resolve_by_canonical_name() {
    let harness = Harness::new().await;
    let own = harness.identity().credentials;

    let plan = harness
        .api
        .plan_by_name(&own, Platform::Twitter, "post")
        .await
        .expect("post workflow should resolve");
    let missing = harness
        .api
        .plan_by_name(&own, Platform::Facebook, "post")
        .await
        .expect_err("no facebook workflows are seeded");

    assert_eq!(plan.workflow_id, harness.post_workflow);
    assert_eq!(plan.steps.len(), 3);
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread")]
async fn heartbeats_report_the_agent_status() {
    let harness = Harness::new().await;
    let identity: AgentIdentity = harness.identity();

    AgentCoordinator::heartbeat(&*harness.api, &identity.credentials, ClientStatus::Idle)
        .await
        .expect("heartbeat should succeed");
    let clients = harness
        .api
        .list_clients(Some(&harness.user))
        .await
        .expect("listing should succeed");

    let client = clients.first().expect("client should be listed");
    assert_eq!(client.status, ClientStatus::Idle);
    assert!(client.live);
}

async fn account_status(harness: &Harness) -> Option<AccountStatus> {
    harness
        .api
        .list_accounts(Some(&harness.user))
        .await
        .expect("listing should succeed")
        .first()
        .map(|account| account.status)
}

async fn fail_login(harness: &Harness) {
    harness
        .enqueue(JobType::Auth, harness.auth_workflow, Map::new())
        .await;
    let (runtime, _, _) = harness.runtime(rejecting_page());
    runtime.run_next().await.expect("claim cycle should succeed");
    assert_eq!(account_status(harness).await, Some(AccountStatus::LoginFailed));
}

#[tokio::test(flavor = "multi_thread")]
async fn auth_run_fails_when_the_account_cannot_take_the_outcome() {
    let harness = Harness::new().await;
    fail_login(&harness).await;
    let payload = JobPayload::new(
        harness.auth_workflow,
        harness.account_id,
        ClientId::new(CLIENT_ID).expect("client id should be valid"),
    );
    let direct = harness
        .api
        .jobs
        .enqueue(harness.user.owner, EnqueueJobRequest::new(JobType::Auth, payload))
        .await
        .expect("enqueue should succeed");
    let (runtime, _, _) = harness.runtime(twitter_page());

    let ran = runtime.run_next().await.expect("claim cycle should succeed");
    let job = harness
        .api
        .get_job(Some(&harness.user), direct.id())
        .await
        .expect("job should be readable");

    assert_eq!(ran, Some(direct.id()));
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.last_error.as_ref().map(|failure| failure.kind),
        Some(ErrorKind::InvalidState)
    );
    assert_eq!(account_status(&harness).await, Some(AccountStatus::LoginFailed));
}

#[tokio::test(flavor = "multi_thread")]
async fn enqueued_auth_jobs_reverify_a_failed_account() {
    let harness = Harness::new().await;
    fail_login(&harness).await;

    let queued = harness
        .enqueue(JobType::Auth, harness.auth_workflow, Map::new())
        .await;
    assert_eq!(
        account_status(&harness).await,
        Some(AccountStatus::PendingVerification)
    );
    let (runtime, _, _) = harness.runtime(twitter_page());
    runtime.run_next().await.expect("claim cycle should succeed");
    let job = harness
        .api
        .get_job(Some(&harness.user), queued.id)
        .await
        .expect("job should be readable");

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(account_status(&harness).await, Some(AccountStatus::Active));
}
