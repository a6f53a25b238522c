//! Shared deployment for end-to-end agent tests.

use drover::account::domain::AccountId;
use drover::agent::adapters::SimulatedLauncher;
use drover::agent::domain::{AgentIdentity, ClientCredentials};
use drover::agent::ports::AgentCoordinator;
use drover::agent::services::AgentRuntime;
use drover::api::{
    CreateMicroActionBody, CreateWorkflowBody, DroverApi, DroverRepositories, EnqueueJobBody,
    InstallClientBody, JobView, LinkAccountBody, ParamSpecBody, UserSession, WorkflowStepBody,
};
use drover::behavior::adapters::{RecordingPacer, SimulatedPage};
use drover::behavior::domain::Point;
use drover::client::domain::{ApiToken, ClientId};
use drover::config::DroverConfig;
use drover::credential::domain::{EncryptionKey, SessionToken};
use drover::credential::services::CredentialBroker;
use drover::job::domain::JobType;
use drover::owner::OwnerId;
use drover::platform::Platform;
use drover::workflow::domain::{ActionType, AuthSignal, MicroActionId, WorkflowId, WorkflowKind};
use eyre::WrapErr;
use mockable::DefaultClock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Client identifier of the deployed agent.
pub const CLIENT_ID: &str = "studio-mac";
const LOGIN_SUBMIT: &str = "button[type=submit]";
const COMPOSER: &str = "div[role=textbox]";
const SEND: &str = "button[data-testid=tweetButtonInline]";

/// A coordinator with one user, one client, one account, and two workflows.
pub struct Deployment {
    /// Coordinator facade.
    pub api: Arc<DroverApi<DefaultClock>>,
    /// The account owner.
    pub user: UserSession,
    /// Agent identity of the installed client.
    pub identity: AgentIdentity,
    /// The linked Twitter account.
    pub account_id: AccountId,
    /// The Twitter auth workflow.
    pub auth_workflow: WorkflowId,
    /// The Twitter post workflow.
    pub post_workflow: WorkflowId,
}

impl Deployment {
    /// Builds an agent runtime over a simulated page.
    #[must_use]
    pub fn runtime(&self, page: SimulatedPage) -> (AgentRuntime<SimulatedLauncher>, SimulatedLauncher) {
        let launcher = SimulatedLauncher::new(page);
        let coordinator: Arc<dyn AgentCoordinator> = self.api.clone();
        let runtime = AgentRuntime::new(
            coordinator,
            Arc::new(launcher.clone()),
            self.identity.clone(),
            Arc::new(RecordingPacer::new()),
            DroverConfig::default().behavior,
        );
        (runtime, launcher)
    }

    /// Queues a job for the linked account.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinator rejects the job.
    pub async fn enqueue(
        &self,
        job_type: JobType,
        workflow_id: WorkflowId,
        params: Map<String, Value>,
    ) -> Result<JobView, eyre::Report> {
        self.api
            .enqueue_job(
                Some(&self.user),
                EnqueueJobBody {
                    job_type,
                    workflow_id,
                    account_id: self.account_id,
                    client_id: CLIENT_ID.to_owned(),
                    params,
                    scheduled_for: None,
                    expires_at: None,
                    max_retries: None,
                },
            )
            .await
            .map_err(|err| eyre::eyre!("enqueue rejected: {err}"))
    }
}

/// A Twitter page on which login succeeds.
#[must_use]
pub fn twitter_page() -> SimulatedPage {
    SimulatedPage::new()
        .with_element("input[autocomplete=username]", Point::new(512.0, 300.0))
        .with_element("input[type=password]", Point::new(512.0, 360.0))
        .with_element(LOGIN_SUBMIT, Point::new(512.0, 430.0))
        .with_element(COMPOSER, Point::new(640.0, 180.0))
        .with_element(SEND, Point::new(900.0, 260.0))
        .with_redirect(LOGIN_SUBMIT, "https://twitter.com/home")
}

/// Job parameters carrying post text.
#[must_use]
pub fn text(value: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("text".to_owned(), Value::from(value));
    params
}

/// Installs a client, seeds Twitter workflows, and links one account.
///
/// # Errors
///
/// Returns an error if any setup call is rejected.
pub async fn deploy() -> Result<Deployment, eyre::Report> {
    let api = Arc::new(DroverApi::new(
        DroverRepositories::in_memory(),
        Arc::new(DefaultClock),
        &DroverConfig::default(),
        EncryptionKey::generate(),
    ));
    let user = UserSession::new(OwnerId::new(), SessionToken::new("e2e-user"));
    let admin = UserSession::new(OwnerId::new(), SessionToken::new("e2e-admin")).admin();
    let install_key = EncryptionKey::generate();

    let installed = api
        .install_client(
            Some(&user),
            InstallClientBody {
                client_id: CLIENT_ID.to_owned(),
                agent_version: "2.0.1".to_owned(),
                install_key: hex::encode(install_key.as_bytes()),
            },
        )
        .await
        .map_err(|err| eyre::eyre!("install rejected: {err}"))?;

    let catalog = Catalog { api: &api, admin: &admin };
    let auth_workflow = catalog.auth().await?;
    let post_workflow = catalog.post().await?;

    let secret = CredentialBroker::encrypt_secret(&install_key, "hunter2")
        .wrap_err("encrypt account secret")?;
    let account = api
        .link_account(
            Some(&user),
            LinkAccountBody {
                platform: Platform::Twitter,
                username: "drover_e2e".to_owned(),
                client_id: CLIENT_ID.to_owned(),
                encrypted_secret: secret.to_base64(),
            },
        )
        .await
        .map_err(|err| eyre::eyre!("link rejected: {err}"))?;

    let client_id = ClientId::new(CLIENT_ID).wrap_err("client id")?;
    Ok(Deployment {
        api,
        user,
        identity: AgentIdentity::new(
            ClientCredentials::new(client_id, ApiToken::new(installed.api_token)),
            install_key,
        ),
        account_id: account.id,
        auth_workflow,
        post_workflow,
    })
}

struct Catalog<'a> {
    api: &'a DroverApi<DefaultClock>,
    admin: &'a UserSession,
}

impl Catalog<'_> {
    async fn action(
        &self,
        name: &str,
        action_type: ActionType,
        target: Option<&str>,
        param: Option<&str>,
    ) -> Result<MicroActionId, eyre::Report> {
        let params = param
            .map(|spec| ParamSpecBody {
                name: spec.to_owned(),
                required: true,
                default: None,
            })
            .into_iter()
            .collect();
        let view = self
            .api
            .admin_create_micro_action(
                Some(self.admin),
                CreateMicroActionBody {
                    name: name.to_owned(),
                    action_type,
                    platform: Platform::Twitter,
                    target: target.map(str::to_owned),
                    params,
                },
            )
            .await
            .map_err(|err| eyre::eyre!("micro-action {name} rejected: {err}"))?;
        Ok(view.id)
    }

    async fn workflow(
        &self,
        name: &str,
        kind: WorkflowKind,
        steps: Vec<WorkflowStepBody>,
    ) -> Result<WorkflowId, eyre::Report> {
        let view = self
            .api
            .admin_create_workflow(
                Some(self.admin),
                CreateWorkflowBody {
                    name: name.to_owned(),
                    platform: Platform::Twitter,
                    kind,
                    steps,
                    auth_workflow_id: None,
                },
            )
            .await
            .map_err(|err| eyre::eyre!("workflow {name} rejected: {err}"))?;
        Ok(view.id)
    }

    async fn auth(&self) -> Result<WorkflowId, eyre::Report> {
        let open = self.action("open_login", ActionType::Navigate, None, Some("url")).await?;
        let user = self
            .action("fill_username", ActionType::Type, Some("input[autocomplete=username]"), Some("text"))
            .await?;
        let pass = self
            .action("fill_password", ActionType::Type, Some("input[type=password]"), Some("text"))
            .await?;
        let submit = self.action("submit", ActionType::Click, Some(LOGIN_SUBMIT), None).await?;
        let check = self
            .action("expect_home", ActionType::AssertUrl, None, Some("contains"))
            .await?;
        let mut landed = step(check, "contains", "twitter.com/home");
        landed.auth_signal = Some(AuthSignal::CredentialsRejected);
        self.workflow(
            "auth",
            WorkflowKind::Auth,
            vec![
                step(open, "url", "https://twitter.com/i/flow/login"),
                step(user, "text", "{{ username }}"),
                step(pass, "text", "{{ password }}"),
                bare(submit),
                landed,
            ],
        )
        .await
    }

    async fn post(&self) -> Result<WorkflowId, eyre::Report> {
        let open = self.action("open_home", ActionType::Navigate, None, Some("url")).await?;
        let write = self
            .action("write_post", ActionType::Type, Some(COMPOSER), Some("text"))
            .await?;
        let send = self.action("send", ActionType::Click, Some(SEND), None).await?;
        self.workflow(
            "post",
            WorkflowKind::Action,
            vec![
                step(open, "url", "https://twitter.com/home"),
                step(write, "text", "{{ text }}"),
                bare(send),
            ],
        )
        .await
    }
}

fn step(id: MicroActionId, name: &str, value: &str) -> WorkflowStepBody {
    let mut params = Map::new();
    params.insert(name.to_owned(), Value::from(value));
    WorkflowStepBody {
        micro_action_id: id,
        params,
        auth_signal: None,
    }
}

fn bare(id: MicroActionId) -> WorkflowStepBody {
    WorkflowStepBody {
        micro_action_id: id,
        params: Map::new(),
        auth_signal: None,
    }
}
