//! Tests for authentication, messages, and views at the facade.

use super::harness::{CLIENT_ID, Harness};
use crate::account::domain::{AccountId, AccountStatus};
use crate::agent::ports::AgentCoordinator;
use crate::api::{
    EnqueueJobBody, HeartbeatBody, InstallClientBody, LinkAccountBody, UpdateWorkflowBody,
    UserSession, VerifyAccountBody, WorkflowQuery,
};
use crate::client::domain::ClientStatus;
use crate::credential::domain::{EncryptionKey, SessionToken, WrappedKey};
use crate::credential::services::CredentialBroker;
use crate::error::ErrorKind;
use crate::job::domain::{JobFailure, JobStatus, JobType};
use crate::owner::OwnerId;
use crate::platform::Platform;
use crate::workflow::domain::WorkflowKind;
use chrono::Duration;
use mockable::Clock;
use serde_json::Map;

#[tokio::test(flavor = "multi_thread")]
async fn calls_without_a_session_are_unauthorized() {
    let harness = Harness::new().await;

    let listed = harness.api.list_jobs(None).await;
    let linked = harness.api.list_accounts(None).await;

    for err in [listed.err(), linked.err()] {
        let err = err.expect("call should be rejected");
        assert_eq!(err.status, 401);
        assert_eq!(err.message, "Unauthorized");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_terminal_job_reports_the_fixed_message() {
    let harness = Harness::new().await;
    let job = harness
        .enqueue(JobType::Post, harness.post_workflow, Map::new())
        .await;

    let cancelled = harness
        .api
        .cancel_job(Some(&harness.user), job.id)
        .await
        .expect("queued job should cancel");
    let again = harness
        .api
        .cancel_job(Some(&harness.user), job.id)
        .await
        .expect_err("cancelled job should not cancel again");

    assert_eq!(cancelled.status, JobStatus::Cancelled);
    assert_eq!(again.status, 400);
    assert_eq!(again.message, "Cannot cancel job in current status");
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_failed_job_is_a_bad_request() {
    let harness = Harness::new().await;
    let job = harness
        .api
        .enqueue_job(Some(&harness.user), post_body(&harness, harness.account_id, CLIENT_ID))
        .await
        .expect("enqueue should succeed");
    let own = harness.identity().credentials;
    harness
        .api
        .claim(&own)
        .await
        .expect("claim should succeed")
        .expect("job should be claimed");
    harness
        .api
        .fail(
            &own,
            job.id,
            JobFailure::new(ErrorKind::Validation, "text is empty"),
        )
        .await
        .expect("failure should be recorded");

    let err = harness
        .api
        .cancel_job(Some(&harness.user), job.id)
        .await
        .expect_err("failed job should not cancel");
    let current = harness
        .api
        .get_job(Some(&harness.user), job.id)
        .await
        .expect("job should be readable");

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Cannot cancel job in current status");
    assert_eq!(current.status, JobStatus::Failed);
}

fn post_body(harness: &Harness, account_id: AccountId, client_id: &str) -> EnqueueJobBody {
    EnqueueJobBody {
        job_type: JobType::Post,
        workflow_id: harness.post_workflow,
        account_id,
        client_id: client_id.to_owned(),
        params: Map::new(),
        scheduled_for: None,
        expires_at: None,
        max_retries: Some(0),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn enqueue_refuses_another_owners_account() {
    let harness = Harness::new().await;
    let stranger = UserSession::new(OwnerId::new(), SessionToken::new("stranger"));

    let err = harness
        .api
        .enqueue_job(Some(&stranger), post_body(&harness, harness.account_id, CLIENT_ID))
        .await
        .expect_err("foreign account should be refused");
    let claimed = harness
        .api
        .claim(&harness.identity().credentials)
        .await
        .expect("claim should succeed");

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Account not found");
    assert!(claimed.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn enqueue_refuses_a_client_owned_by_someone_else() {
    let harness = Harness::new().await;
    let stranger = UserSession::new(OwnerId::new(), SessionToken::new("stranger"));
    harness
        .api
        .install_client(
            Some(&stranger),
            InstallClientBody {
                client_id: "stranger-01".to_owned(),
                agent_version: "1.4.0".to_owned(),
                install_key: hex::encode(EncryptionKey::generate().as_bytes()),
            },
        )
        .await
        .expect("stranger install should succeed");

    let err = harness
        .api
        .enqueue_job(
            Some(&harness.user),
            post_body(&harness, harness.account_id, "stranger-01"),
        )
        .await
        .expect_err("foreign client should be refused");

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Client not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn enqueue_requires_the_account_to_be_linked_to_the_client() {
    let harness = Harness::new().await;
    harness
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

    let err = harness
        .api
        .enqueue_job(
            Some(&harness.user),
            post_body(&harness, harness.account_id, "desktop-02"),
        )
        .await
        .expect_err("unlinked client should be refused");

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Account is not linked to this client");
}

#[tokio::test(flavor = "multi_thread")]
async fn enqueue_requires_the_workflow_to_match_the_account_platform() {
    let harness = Harness::new().await;
    let secret = CredentialBroker::encrypt_secret(&harness.install_key, "hunter2")
        .expect("secret encryption should succeed");
    let instagram = harness
        .api
        .link_account(
            Some(&harness.user),
            LinkAccountBody {
                platform: Platform::Instagram,
                username: "drover_gram".to_owned(),
                client_id: CLIENT_ID.to_owned(),
                encrypted_secret: secret.to_base64(),
            },
        )
        .await
        .expect("account link should succeed");

    let err = harness
        .api
        .enqueue_job(Some(&harness.user), post_body(&harness, instagram.id, CLIENT_ID))
        .await
        .expect_err("twitter workflow should not run for an instagram account");

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Workflow platform does not match the account");
}

#[tokio::test(flavor = "multi_thread")]
async fn jobs_of_other_owners_are_not_found() {
    let harness = Harness::new().await;
    let job = harness
        .enqueue(JobType::Post, harness.post_workflow, Map::new())
        .await;
    let stranger = UserSession::new(OwnerId::new(), SessionToken::new("stranger"));

    let err = harness
        .api
        .get_job(Some(&stranger), job.id)
        .await
        .expect_err("foreign job should be hidden");

    assert_eq!(err.status, 404);
}

#[tokio::test(flavor = "multi_thread")]
async fn enqueue_rejects_a_workflow_of_the_wrong_kind() {
    let harness = Harness::new().await;
    let err = harness
        .api
        .enqueue_job(
            Some(&harness.user),
            EnqueueJobBody {
                job_type: JobType::Auth,
                workflow_id: harness.post_workflow,
                account_id: harness.account_id,
                client_id: CLIENT_ID.to_owned(),
                params: Map::new(),
                scheduled_for: None,
                expires_at: None,
                max_retries: None,
            },
        )
        .await
        .expect_err("auth job on an action workflow should be rejected");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.status, 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn heartbeat_requires_the_client_token() {
    let harness = Harness::new().await;
    let body = || HeartbeatBody {
        client_id: CLIENT_ID.to_owned(),
        status: Some(ClientStatus::Busy),
        agent_version: None,
    };

    let rejected = harness
        .api
        .heartbeat(Some("Bearer not-the-token"), body())
        .await
        .expect_err("wrong token should be rejected");
    let missing = harness
        .api
        .heartbeat(None, body())
        .await
        .expect_err("missing token should be rejected");
    let accepted = harness
        .api
        .heartbeat(Some(&format!("Bearer {}", harness.api_token)), body())
        .await
        .expect("heartbeat should be accepted");

    assert_eq!(rejected.status, 401);
    assert_eq!(missing.status, 401);
    assert_eq!(accepted.status, ClientStatus::Busy);
    assert!(accepted.last_heartbeat.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn rotated_tokens_replace_the_old_one() {
    let harness = Harness::new().await;
    let old = format!("Bearer {}", harness.api_token);

    let rotated = harness
        .api
        .rotate_client_token(Some(&old), Some(CLIENT_ID))
        .await
        .expect("rotation should succeed");
    let body = HeartbeatBody {
        client_id: CLIENT_ID.to_owned(),
        status: None,
        agent_version: None,
    };
    let stale = harness.api.heartbeat(Some(&old), body.clone()).await;
    let fresh = harness
        .api
        .heartbeat(Some(&format!("Bearer {}", rotated.api_token)), body)
        .await;

    assert_eq!(stale.map_err(|err| err.status), Err(401));
    assert!(fresh.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn deregistration_needs_a_matching_client_header() {
    let harness = Harness::new().await;
    let bearer = format!("Bearer {}", harness.api_token);

    let wrong = harness
        .api
        .deregister_client(Some(&bearer), Some("someone-else"))
        .await
        .expect_err("foreign client id should be rejected");
    harness
        .api
        .deregister_client(Some(&bearer), Some(CLIENT_ID))
        .await
        .expect("self deregistration should succeed");
    let remaining = harness
        .api
        .list_clients(Some(&harness.user))
        .await
        .expect("listing should succeed");

    assert_eq!(wrong.status, 401);
    assert!(remaining.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn wrapped_key_opens_only_with_the_session_it_was_made_for() {
    let harness = Harness::new().await;

    let view = harness
        .api
        .encryption_key(Some(&harness.user), CLIENT_ID)
        .await
        .expect("key export should succeed");
    let wrapped = WrappedKey::from_base64(&view.wrapped_key).expect("key should be base64");

    let opened =
        CredentialBroker::unwrap_client_key(&wrapped, harness.user.owner, &harness.user.token)
            .expect("the issuing session should open the key");
    let foreign = CredentialBroker::unwrap_client_key(
        &wrapped,
        harness.user.owner,
        &SessionToken::new("another-session"),
    );

    assert!(opened == harness.install_key);
    assert!(foreign.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn verifying_an_unknown_account_is_a_bad_request() {
    let harness = Harness::new().await;

    let err = harness
        .api
        .verify_account(
            Some(&harness.user),
            VerifyAccountBody {
                account_id: AccountId::new(),
            },
        )
        .await
        .expect_err("unknown account should be rejected");

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Account not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn verifying_an_account_queues_an_auth_job() {
    let harness = Harness::new().await;

    let job = harness
        .api
        .verify_account(
            Some(&harness.user),
            VerifyAccountBody {
                account_id: harness.account_id,
            },
        )
        .await
        .expect("verification should be queued");
    let accounts = harness
        .api
        .list_accounts(Some(&harness.user))
        .await
        .expect("listing should succeed");

    assert_eq!(job.job_type, JobType::Auth);
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(
        accounts.first().map(|account| account.status),
        Some(AccountStatus::PendingVerification)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn admin_listing_is_restricted_and_filterable() {
    let harness = Harness::new().await;

    let denied = harness
        .api
        .admin_list_workflows(Some(&harness.user), WorkflowQuery::default())
        .await
        .expect_err("non-admins should be rejected");
    let all = harness
        .api
        .admin_list_workflows(Some(&harness.admin), WorkflowQuery::default())
        .await
        .expect("admin listing should succeed");
    let auth_only = harness
        .api
        .admin_list_workflows(
            Some(&harness.admin),
            WorkflowQuery {
                kind: Some(WorkflowKind::Auth),
                ..WorkflowQuery::default()
            },
        )
        .await
        .expect("filtered listing should succeed");

    assert_eq!(denied.status, 401);
    assert_eq!(all.total, 2);
    assert_eq!(auth_only.total, 1);
    let auth = auth_only.items.first().expect("auth workflow should be listed");
    assert_eq!(auth.steps.len(), 5);
    assert_eq!(
        auth.steps.first().map(|step| step.micro_action.name.as_str()),
        Some("open_page")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn deactivated_workflows_leave_the_default_listing() {
    let harness = Harness::new().await;

    harness
        .api
        .admin_deactivate_workflow(Some(&harness.admin), harness.post_workflow)
        .await
        .expect("deactivation should succeed");
    let active = harness
        .api
        .admin_list_workflows(Some(&harness.admin), WorkflowQuery::default())
        .await
        .expect("listing should succeed");
    let everything = harness
        .api
        .admin_list_workflows(
            Some(&harness.admin),
            WorkflowQuery {
                include_inactive: true,
                ..WorkflowQuery::default()
            },
        )
        .await
        .expect("listing should succeed");

    assert_eq!(active.total, 1);
    assert_eq!(everything.total, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn updating_a_workflow_can_require_login() {
    let harness = Harness::new().await;

    let updated = harness
        .api
        .admin_update_workflow(
            Some(&harness.admin),
            harness.post_workflow,
            UpdateWorkflowBody {
                auth_workflow_id: Some(harness.auth_workflow),
                ..UpdateWorkflowBody::default()
            },
        )
        .await
        .expect("update should succeed");

    assert!(updated.requires_auth);
    assert_eq!(updated.auth_workflow_id, Some(harness.auth_workflow));
}

#[tokio::test(flavor = "multi_thread")]
async fn sweeping_fails_overdue_jobs() {
    let harness = Harness::new().await;
    let job = harness
        .api
        .enqueue_job(
            Some(&harness.user),
            EnqueueJobBody {
                job_type: JobType::Post,
                workflow_id: harness.post_workflow,
                account_id: harness.account_id,
                client_id: CLIENT_ID.to_owned(),
                params: Map::new(),
                scheduled_for: None,
                expires_at: Some(harness.clock.utc() + Duration::seconds(30)),
                max_retries: None,
            },
        )
        .await
        .expect("enqueue should succeed");

    harness.clock.advance(Duration::seconds(31));
    let expired = harness
        .api
        .sweep_expired()
        .await
        .expect("sweep should succeed");
    let current = harness
        .api
        .get_job(Some(&harness.user), job.id)
        .await
        .expect("job should still be readable");

    assert_eq!(expired, 1);
    assert_eq!(current.status, JobStatus::Failed);
    assert!(current.last_error.is_some());
}
