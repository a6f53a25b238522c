//! The Drover service facade.

use super::dto::{
    AccountView, ClientView, CreateMicroActionBody, CreateWorkflowBody, EncryptionKeyView,
    EnqueueJobBody, HeartbeatBody, HeartbeatView, InstallClientBody, InstalledClientView,
    JobView, LinkAccountBody, MicroActionView, PageView, UpdateWorkflowBody, VerifyAccountBody,
    WorkflowQuery, WorkflowStepBody, WorkflowView,
};
use super::{ApiError, ApiResult, UserSession};
use crate::account::adapters::memory::InMemoryAccountRepository;
use crate::account::ports::AccountRepository;
use crate::account::services::{AccountService, LinkAccountRequest};
use crate::client::adapters::memory::InMemoryClientRepository;
use crate::client::domain::{ApiToken, ClientId};
use crate::client::ports::ClientRepository;
use crate::client::services::{ClientRegistryService, HeartbeatRequest, RegisterClientRequest};
use crate::config::DroverConfig;
use crate::credential::domain::{EncryptedSecret, EncryptionKey};
use crate::credential::services::CredentialBroker;
use crate::error::{Classify, ErrorKind};
use crate::job::adapters::memory::InMemoryJobRepository;
use crate::job::domain::{JobId, JobPayload, JobType};
use crate::job::ports::{ClaimEligibility, JobRepository};
use crate::job::services::{EnqueueJobRequest, JobQueueService};
use crate::workflow::adapters::memory::{
    InMemoryMicroActionRepository, InMemoryWorkflowRepository,
};
use crate::workflow::domain::{Workflow, WorkflowId, WorkflowKind, WorkflowStep};
use crate::workflow::ports::{
    MicroActionRepository, PageRequest, WorkflowFilter, WorkflowRepository,
};
use crate::workflow::services::{
    CreateWorkflowRequest, RegisterMicroActionRequest, UpdateWorkflowRequest, WorkflowService,
};
use mockable::Clock;
use std::fmt;
use std::sync::Arc;

/// Repositories backing a [`DroverApi`].
#[derive(Clone)]
pub struct DroverRepositories {
    /// Job storage.
    pub jobs: Arc<dyn JobRepository>,
    /// Client storage.
    pub clients: Arc<dyn ClientRepository>,
    /// Account storage.
    pub accounts: Arc<dyn AccountRepository>,
    /// Workflow storage.
    pub workflows: Arc<dyn WorkflowRepository>,
    /// Micro-action catalog storage.
    pub micro_actions: Arc<dyn MicroActionRepository>,
}

impl DroverRepositories {
    /// Creates empty in-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            jobs: Arc::new(InMemoryJobRepository::new()),
            clients: Arc::new(InMemoryClientRepository::new()),
            accounts: Arc::new(InMemoryAccountRepository::new()),
            workflows: Arc::new(InMemoryWorkflowRepository::new()),
            micro_actions: Arc::new(InMemoryMicroActionRepository::new()),
        }
    }
}

/// Entry point for users, admins, and agents.
pub struct DroverApi<C>
where
    C: Clock + Send + Sync + 'static,
{
    pub(super) jobs: JobQueueService<dyn JobRepository, C>,
    pub(super) clients: Arc<ClientRegistryService<dyn ClientRepository, C>>,
    pub(super) accounts: AccountService<dyn AccountRepository, C>,
    pub(super) workflows: WorkflowService<dyn WorkflowRepository, dyn MicroActionRepository, C>,
}

impl<C> DroverApi<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Wires the services over `repositories`.
    ///
    /// `master_key` seals installation keys at rest.
    pub fn new(
        repositories: DroverRepositories,
        clock: Arc<C>,
        config: &DroverConfig,
        master_key: EncryptionKey,
    ) -> Self {
        let broker = Arc::new(CredentialBroker::new(master_key));
        let clients = Arc::new(ClientRegistryService::new(
            repositories.clients,
            broker,
            Arc::clone(&clock),
            config.clients.clone(),
        ));
        let eligibility: Arc<dyn ClaimEligibility> = clients.clone();
        let jobs = JobQueueService::new(
            repositories.jobs,
            Arc::clone(&repositories.workflows),
            eligibility,
            Arc::clone(&clock),
            config.jobs.clone(),
        );
        let accounts = AccountService::new(repositories.accounts, Arc::clone(&clock));
        let workflows =
            WorkflowService::new(repositories.workflows, repositories.micro_actions, clock);
        Self {
            jobs,
            clients,
            accounts,
            workflows,
        }
    }

    // Jobs

    /// Submits a job.
    ///
    /// The account and client must both belong to the caller, the account
    /// must be linked to that client, and the workflow must target the
    /// account's platform. Auth jobs put the account back into verification
    /// the same way [`DroverApi::verify_account`] does.
    ///
    /// # Errors
    ///
    /// Returns 401 without a session, or 400/404 when the request is invalid.
    pub async fn enqueue_job(
        &self,
        session: Option<&UserSession>,
        body: EnqueueJobBody,
    ) -> ApiResult<JobView> {
        let session = authenticated(session)?;
        let client_id = parse_client_id(&body.client_id)?;
        let account = self
            .accounts
            .get(session.owner, body.account_id)
            .await
            .map_err(|err| not_found_as_bad_request(&err, "Account not found"))?;
        self.clients
            .find(session.owner, &client_id)
            .await
            .map_err(|err| not_found_as_bad_request(&err, "Client not found"))?;
        if account.client_id() != &client_id {
            return Err(ApiError::bad_request("Account is not linked to this client"));
        }
        let workflow = self
            .workflows
            .find(body.workflow_id)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        if workflow
            .as_ref()
            .is_some_and(|found| found.platform() != account.platform())
        {
            return Err(ApiError::bad_request("Workflow platform does not match the account"));
        }
        let reverifies = workflow
            .as_ref()
            .is_some_and(|found| found.kind() == WorkflowKind::Auth);
        if body.job_type == JobType::Auth && reverifies {
            self.accounts
                .request_verification(session.owner, account.id())
                .await
                .map_err(|err| ApiError::from_service(&err))?;
        }
        let payload = JobPayload {
            workflow_id: body.workflow_id,
            account_id: body.account_id,
            client_id,
            params: body.params,
        };
        let mut request = EnqueueJobRequest::new(body.job_type, payload);
        if let Some(at) = body.scheduled_for {
            request = request.scheduled_for(at);
        }
        if let Some(at) = body.expires_at {
            request = request.expires_at(at);
        }
        if let Some(max) = body.max_retries {
            request = request.max_retries(max);
        }
        let job = self
            .jobs
            .enqueue(session.owner, request)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(JobView::from(&job))
    }

    /// Reads one of the caller's jobs.
    ///
    /// # Errors
    ///
    /// Returns 401 without a session, or 404 when the job is absent or owned
    /// by someone else.
    pub async fn get_job(&self, session: Option<&UserSession>, id: JobId) -> ApiResult<JobView> {
        let session = authenticated(session)?;
        let job = self
            .jobs
            .get(session.owner, id)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(JobView::from(&job))
    }

    /// Lists the caller's jobs, newest first.
    ///
    /// # Errors
    ///
    /// Returns 401 without a session.
    pub async fn list_jobs(&self, session: Option<&UserSession>) -> ApiResult<Vec<JobView>> {
        let session = authenticated(session)?;
        let jobs = self
            .jobs
            .list(session.owner)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(jobs.iter().map(JobView::from).collect())
    }

    /// Cancels one of the caller's jobs.
    ///
    /// # Errors
    ///
    /// Returns 400 `Cannot cancel job in current status` for terminal jobs.
    pub async fn cancel_job(
        &self,
        session: Option<&UserSession>,
        id: JobId,
    ) -> ApiResult<JobView> {
        let session = authenticated(session)?;
        let job = self.jobs.cancel(session.owner, id).await.map_err(|err| {
            let api = ApiError::from_service(&err);
            if api.kind == ErrorKind::InvalidState {
                api.with_message("Cannot cancel job in current status")
            } else {
                api
            }
        })?;
        Ok(JobView::from(&job))
    }

    /// Fails every job past its expiry. Returns how many were expired.
    ///
    /// # Errors
    ///
    /// Returns 500 when storage fails.
    pub async fn sweep_expired(&self) -> ApiResult<usize> {
        self.jobs
            .sweep_expired()
            .await
            .map_err(|err| ApiError::from_service(&err))
    }

    // Clients

    /// Registers a client installation for the caller.
    ///
    /// # Errors
    ///
    /// Returns 400 for a malformed key or identifier, or when the identifier
    /// is taken.
    pub async fn install_client(
        &self,
        session: Option<&UserSession>,
        body: InstallClientBody,
    ) -> ApiResult<InstalledClientView> {
        let session = authenticated(session)?;
        let install_key = EncryptionKey::from_hex(&body.install_key)
            .map_err(|_| ApiError::bad_request("installKey must be 64 hex characters"))?;
        let registered = self
            .clients
            .register(
                session.owner,
                RegisterClientRequest::new(body.client_id, body.agent_version, install_key),
            )
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(InstalledClientView {
            client_id: registered.client.client_id().to_string(),
            api_token: registered.api_token.expose().to_owned(),
            token_expires_at: registered.client.token_expires_at(),
        })
    }

    /// Records a heartbeat from an agent.
    ///
    /// # Errors
    ///
    /// Returns 401 when the bearer token is missing, wrong, or expired.
    pub async fn heartbeat(
        &self,
        bearer: Option<&str>,
        body: HeartbeatBody,
    ) -> ApiResult<HeartbeatView> {
        let token = bearer_token(bearer)?;
        let client_id = ClientId::new(body.client_id).map_err(|_| ApiError::unauthorized())?;
        let client = self
            .clients
            .heartbeat(
                &client_id,
                &token,
                HeartbeatRequest {
                    status: body.status,
                    agent_version: body.agent_version,
                },
            )
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(HeartbeatView::from(&client))
    }

    /// Removes a client on its own request.
    ///
    /// # Errors
    ///
    /// Returns 401 unless the bearer token belongs to the client named in
    /// the `X-Client-ID` header.
    pub async fn deregister_client(
        &self,
        bearer: Option<&str>,
        client_id_header: Option<&str>,
    ) -> ApiResult<()> {
        let token = bearer_token(bearer)?;
        let client_id = client_id_header
            .and_then(|raw| ClientId::new(raw).ok())
            .ok_or_else(ApiError::unauthorized)?;
        self.clients
            .deregister(&client_id, &token)
            .await
            .map_err(|err| ApiError::from_service(&err))
    }

    /// Issues a fresh api token to a client.
    ///
    /// # Errors
    ///
    /// Returns 401 unless the bearer token belongs to the named client.
    pub async fn rotate_client_token(
        &self,
        bearer: Option<&str>,
        client_id_header: Option<&str>,
    ) -> ApiResult<InstalledClientView> {
        let token = bearer_token(bearer)?;
        let client_id = client_id_header
            .and_then(|raw| ClientId::new(raw).ok())
            .ok_or_else(ApiError::unauthorized)?;
        let fresh = self
            .clients
            .rotate_token(&client_id, &token)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        let client = self
            .clients
            .authenticate(&client_id, &fresh)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(InstalledClientView {
            client_id: client_id.to_string(),
            api_token: fresh.expose().to_owned(),
            token_expires_at: client.token_expires_at(),
        })
    }

    /// Lists the caller's clients with liveness.
    ///
    /// # Errors
    ///
    /// Returns 401 without a session.
    pub async fn list_clients(&self, session: Option<&UserSession>) -> ApiResult<Vec<ClientView>> {
        let session = authenticated(session)?;
        let clients = self
            .clients
            .list(session.owner)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(clients.iter().map(ClientView::from).collect())
    }

    /// Returns a client key wrapped for the caller's session.
    ///
    /// # Errors
    ///
    /// Returns 401 without a session, or 404 when the client is not owned.
    pub async fn encryption_key(
        &self,
        session: Option<&UserSession>,
        client_id: &str,
    ) -> ApiResult<EncryptionKeyView> {
        let session = authenticated(session)?;
        let client_id = parse_client_id(client_id)?;
        let wrapped = self
            .clients
            .wrapped_client_key(session.owner, &client_id, &session.token)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(EncryptionKeyView {
            client_id: client_id.to_string(),
            wrapped_key: wrapped.to_base64(),
        })
    }

    // Accounts

    /// Links a platform account to one of the caller's clients.
    ///
    /// # Errors
    ///
    /// Returns 400 for malformed input, or 404 when the client is not owned.
    pub async fn link_account(
        &self,
        session: Option<&UserSession>,
        body: LinkAccountBody,
    ) -> ApiResult<AccountView> {
        let session = authenticated(session)?;
        let client_id = parse_client_id(&body.client_id)?;
        let secret = EncryptedSecret::from_base64(&body.encrypted_secret)
            .map_err(|_| ApiError::bad_request("encryptedSecret must be base64"))?;
        self.clients
            .find(session.owner, &client_id)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        let account = self
            .accounts
            .link(
                session.owner,
                LinkAccountRequest::new(body.platform, body.username, client_id, secret),
            )
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(AccountView::from(&account))
    }

    /// Lists the caller's accounts.
    ///
    /// # Errors
    ///
    /// Returns 401 without a session.
    pub async fn list_accounts(&self, session: Option<&UserSession>) -> ApiResult<Vec<AccountView>> {
        let session = authenticated(session)?;
        let accounts = self
            .accounts
            .list(session.owner)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(accounts.iter().map(AccountView::from).collect())
    }

    /// Queues an auth job that re-verifies an account.
    ///
    /// # Errors
    ///
    /// Returns 400 when the account is absent or not owned, or 404 when the
    /// platform has no active auth workflow.
    pub async fn verify_account(
        &self,
        session: Option<&UserSession>,
        body: VerifyAccountBody,
    ) -> ApiResult<JobView> {
        let session = authenticated(session)?;
        let account = self
            .accounts
            .request_verification(session.owner, body.account_id)
            .await
            .map_err(|err| not_found_as_bad_request(&err, "Account not found"))?;
        let workflow = self
            .workflows
            .auth_workflow(account.platform())
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        let payload = JobPayload::new(workflow.id(), account.id(), account.client_id().clone());
        let job = self
            .jobs
            .enqueue(session.owner, EnqueueJobRequest::new(JobType::Auth, payload))
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        tracing::info!(account_id = %account.id(), job_id = %job.id(), "queued account verification");
        Ok(JobView::from(&job))
    }

    // Admin

    /// Adds a micro-action to the catalog.
    ///
    /// # Errors
    ///
    /// Returns 401 for non-admins, or 400 for invalid definitions.
    pub async fn admin_create_micro_action(
        &self,
        session: Option<&UserSession>,
        body: CreateMicroActionBody,
    ) -> ApiResult<MicroActionView> {
        admin(session)?;
        let mut request = RegisterMicroActionRequest::new(body.name, body.action_type, body.platform);
        if let Some(target) = body.target {
            request = request.with_target(target);
        }
        for spec in body.params {
            request = request.with_param(spec.into());
        }
        let action = self
            .workflows
            .register_micro_action(request)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(MicroActionView::from(&action))
    }

    /// Creates a workflow.
    ///
    /// # Errors
    ///
    /// Returns 401 for non-admins, or 400 for invalid definitions.
    pub async fn admin_create_workflow(
        &self,
        session: Option<&UserSession>,
        body: CreateWorkflowBody,
    ) -> ApiResult<WorkflowView> {
        admin(session)?;
        let steps = body.steps.into_iter().map(to_step).collect();
        let mut request = CreateWorkflowRequest::new(body.name, body.platform, body.kind, steps);
        if let Some(auth_id) = body.auth_workflow_id {
            request = request.requiring_auth(auth_id);
        }
        let workflow = self
            .workflows
            .create_workflow(request)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        self.workflow_view(&workflow).await
    }

    /// Updates a workflow in place.
    ///
    /// # Errors
    ///
    /// Returns 401 for non-admins, 404 for unknown workflows, or 400 for
    /// invalid changes.
    pub async fn admin_update_workflow(
        &self,
        session: Option<&UserSession>,
        id: WorkflowId,
        body: UpdateWorkflowBody,
    ) -> ApiResult<WorkflowView> {
        admin(session)?;
        let request = UpdateWorkflowRequest {
            name: body.name,
            steps: body
                .steps
                .map(|steps| steps.into_iter().map(to_step).collect()),
            requires_auth: body.auth_workflow_id.map(|_| true),
            auth_workflow_id: body.auth_workflow_id.map(Some),
            ..UpdateWorkflowRequest::default()
        };
        let workflow = self
            .workflows
            .update_workflow(id, request)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        self.workflow_view(&workflow).await
    }

    /// Deactivates a workflow.
    ///
    /// # Errors
    ///
    /// Returns 401 for non-admins or 404 for unknown workflows.
    pub async fn admin_deactivate_workflow(
        &self,
        session: Option<&UserSession>,
        id: WorkflowId,
    ) -> ApiResult<WorkflowView> {
        admin(session)?;
        let workflow = self
            .workflows
            .deactivate(id)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        self.workflow_view(&workflow).await
    }

    /// Lists workflows with micro-actions inlined.
    ///
    /// # Errors
    ///
    /// Returns 401 for non-admins.
    pub async fn admin_list_workflows(
        &self,
        session: Option<&UserSession>,
        query: WorkflowQuery,
    ) -> ApiResult<PageView<WorkflowView>> {
        admin(session)?;
        let filter = WorkflowFilter {
            platform: query.platform,
            kind: query.kind,
            include_inactive: query.include_inactive,
        };
        let page = self
            .workflows
            .list(filter, PageRequest::page(query.page, query.per_page))
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(PageView::from_page(page, |plan| WorkflowView::from(&plan)))
    }

    /// Removes any client.
    ///
    /// # Errors
    ///
    /// Returns 401 for non-admins or 404 for unknown clients.
    pub async fn admin_deregister_client(
        &self,
        session: Option<&UserSession>,
        client_id: &str,
    ) -> ApiResult<()> {
        admin(session)?;
        let client_id = parse_client_id(client_id)?;
        self.clients
            .admin_deregister(&client_id)
            .await
            .map_err(|err| ApiError::from_service(&err))
    }

    async fn workflow_view(&self, workflow: &Workflow) -> ApiResult<WorkflowView> {
        let plan = self
            .workflows
            .enrich(workflow)
            .await
            .map_err(|err| ApiError::from_service(&err))?;
        Ok(WorkflowView::from(&plan))
    }
}

fn authenticated(session: Option<&UserSession>) -> ApiResult<&UserSession> {
    session.ok_or_else(ApiError::unauthorized)
}

fn admin(session: Option<&UserSession>) -> ApiResult<&UserSession> {
    authenticated(session).and_then(|session| {
        if session.is_admin {
            Ok(session)
        } else {
            Err(ApiError::unauthorized())
        }
    })
}

fn bearer_token(header: Option<&str>) -> ApiResult<ApiToken> {
    let raw = header.map(str::trim).unwrap_or_default();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized());
    }
    Ok(ApiToken::new(token))
}

fn not_found_as_bad_request<E: Classify + fmt::Display>(err: &E, message: &str) -> ApiError {
    let api = ApiError::from_service(err);
    if api.kind == ErrorKind::NotFound {
        ApiError::bad_request(message)
    } else {
        api
    }
}

fn parse_client_id(raw: &str) -> ApiResult<ClientId> {
    ClientId::new(raw).map_err(|err| ApiError::bad_request(err.to_string()))
}

fn to_step(body: WorkflowStepBody) -> WorkflowStep {
    WorkflowStep {
        action_id: body.micro_action_id,
        params: body.params,
        auth_signal: body.auth_signal,
    }
}
