//! A coordinator with one user, one Twitter client, and a seeded catalog.

use crate::account::domain::AccountId;
use crate::agent::adapters::SimulatedLauncher;
use crate::agent::domain::{AgentIdentity, ClientCredentials};
use crate::agent::ports::AgentCoordinator;
use crate::agent::services::AgentRuntime;
use crate::api::{
    CreateMicroActionBody, CreateWorkflowBody, DroverApi, DroverRepositories, EnqueueJobBody,
    InstallClientBody, JobView, LinkAccountBody, ParamSpecBody, UserSession, WorkflowStepBody,
};
use crate::behavior::adapters::{RecordingPacer, SimulatedPage};
use crate::behavior::domain::Point;
use crate::client::domain::{ApiToken, ClientId};
use crate::clock::ManualClock;
use crate::config::DroverConfig;
use crate::credential::domain::{EncryptionKey, SessionToken};
use crate::credential::services::CredentialBroker;
use crate::job::domain::JobType;
use crate::owner::OwnerId;
use crate::platform::Platform;
use crate::workflow::domain::{ActionType, AuthSignal, MicroActionId, WorkflowId, WorkflowKind};
use serde_json::{Map, Value};
use std::sync::Arc;

pub(crate) const CLIENT_ID: &str = "laptop-01";
pub(crate) const USERNAME: &str = "drover_tester";
pub(crate) const PASSWORD: &str = "correct horse";
pub(crate) const LOGIN_SUBMIT: &str = "button[data-testid=login]";
pub(crate) const POST_BUTTON: &str = "button[data-testid=tweetButton]";
pub(crate) const HOME_URL: &str = "https://twitter.com/home";

pub(crate) type TestApi = DroverApi<ManualClock>;

/// Everything a test needs to drive the coordinator and an agent.
pub(crate) struct Harness {
    pub(crate) api: Arc<TestApi>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) user: UserSession,
    pub(crate) admin: UserSession,
    pub(crate) api_token: String,
    pub(crate) install_key: EncryptionKey,
    pub(crate) account_id: AccountId,
    pub(crate) auth_workflow: WorkflowId,
    pub(crate) post_workflow: WorkflowId,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let api = Arc::new(DroverApi::new(
            DroverRepositories::in_memory(),
            Arc::clone(&clock),
            &DroverConfig::default(),
            EncryptionKey::generate(),
        ));
        let user = UserSession::new(OwnerId::new(), SessionToken::new("user-session"));
        let admin = UserSession::new(OwnerId::new(), SessionToken::new("admin-session")).admin();
        let install_key = EncryptionKey::generate();

        let installed = api
            .install_client(
                Some(&user),
                InstallClientBody {
                    client_id: CLIENT_ID.to_owned(),
                    agent_version: "1.4.0".to_owned(),
                    install_key: hex::encode(install_key.as_bytes()),
                },
            )
            .await
            .expect("client install should succeed");

        let (auth_workflow, post_workflow) = seed_twitter(&api, &admin).await;

        let secret = CredentialBroker::encrypt_secret(&install_key, PASSWORD)
            .expect("secret encryption should succeed");
        let account = api
            .link_account(
                Some(&user),
                LinkAccountBody {
                    platform: Platform::Twitter,
                    username: USERNAME.to_owned(),
                    client_id: CLIENT_ID.to_owned(),
                    encrypted_secret: secret.to_base64(),
                },
            )
            .await
            .expect("account link should succeed");

        Self {
            api,
            clock,
            user,
            admin,
            api_token: installed.api_token,
            install_key,
            account_id: account.id,
            auth_workflow,
            post_workflow,
        }
    }

    pub(crate) fn identity(&self) -> AgentIdentity {
        let client_id = ClientId::new(CLIENT_ID).expect("client id should be valid");
        AgentIdentity::new(
            ClientCredentials::new(client_id, ApiToken::new(self.api_token.clone())),
            self.install_key.clone(),
        )
    }

    pub(crate) fn runtime(
        &self,
        page: SimulatedPage,
    ) -> (AgentRuntime<SimulatedLauncher>, SimulatedLauncher, RecordingPacer) {
        let launcher = SimulatedLauncher::new(page);
        let pacer = RecordingPacer::new();
        let coordinator: Arc<dyn AgentCoordinator> = self.api.clone();
        let runtime = AgentRuntime::new(
            coordinator,
            Arc::new(launcher.clone()),
            self.identity(),
            Arc::new(pacer.clone()),
            DroverConfig::default().behavior,
        );
        (runtime, launcher, pacer)
    }

    pub(crate) async fn enqueue(
        &self,
        job_type: JobType,
        workflow_id: WorkflowId,
        params: Map<String, Value>,
    ) -> JobView {
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
            .expect("enqueue should succeed")
    }
}

/// A page on which the login form and composer exist and login succeeds.
pub(crate) fn twitter_page() -> SimulatedPage {
    rejecting_page().with_redirect(LOGIN_SUBMIT, HOME_URL)
}

/// A page on which login never leaves the form.
pub(crate) fn rejecting_page() -> SimulatedPage {
    SimulatedPage::new()
        .with_element("input[name=username]", Point::new(420.0, 310.0))
        .with_element("input[name=password]", Point::new(420.0, 370.0))
        .with_element(LOGIN_SUBMIT, Point::new(420.0, 440.0))
        .with_element("div[data-testid=tweetTextarea]", Point::new(600.0, 220.0))
        .with_element(POST_BUTTON, Point::new(860.0, 330.0))
}

pub(crate) fn text_params(text: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("text".to_owned(), Value::from(text));
    params
}

async fn action(
    api: &TestApi,
    admin: &UserSession,
    name: &str,
    action_type: ActionType,
    target: Option<&str>,
    param: Option<&str>,
) -> MicroActionId {
    let params = param
        .map(|name| ParamSpecBody {
            name: name.to_owned(),
            required: true,
            default: None,
        })
        .into_iter()
        .collect();
    api.admin_create_micro_action(
        Some(admin),
        CreateMicroActionBody {
            name: name.to_owned(),
            action_type,
            platform: Platform::Twitter,
            target: target.map(str::to_owned),
            params,
        },
    )
    .await
    .expect("micro-action registration should succeed")
    .id
}

fn step(id: MicroActionId, param: Option<(&str, &str)>) -> WorkflowStepBody {
    let mut params = Map::new();
    if let Some((name, value)) = param {
        params.insert(name.to_owned(), Value::from(value));
    }
    WorkflowStepBody {
        micro_action_id: id,
        params,
        auth_signal: None,
    }
}

async fn seed_twitter(api: &TestApi, admin: &UserSession) -> (WorkflowId, WorkflowId) {
    let navigate = action(api, admin, "open_page", ActionType::Navigate, None, Some("url")).await;
    let username = action(
        api,
        admin,
        "enter_username",
        ActionType::Type,
        Some("input[name=username]"),
        Some("text"),
    )
    .await;
    let password = action(
        api,
        admin,
        "enter_password",
        ActionType::Type,
        Some("input[name=password]"),
        Some("text"),
    )
    .await;
    let submit = action(api, admin, "submit_login", ActionType::Click, Some(LOGIN_SUBMIT), None).await;
    let confirm = action(api, admin, "confirm_url", ActionType::AssertUrl, None, Some("contains")).await;
    let compose = action(
        api,
        admin,
        "compose_post",
        ActionType::Type,
        Some("div[data-testid=tweetTextarea]"),
        Some("text"),
    )
    .await;
    let send = action(api, admin, "send_post", ActionType::Click, Some(POST_BUTTON), None).await;

    let mut confirm_home = step(confirm, Some(("contains", "/home")));
    confirm_home.auth_signal = Some(AuthSignal::CredentialsRejected);
    let auth = api
        .admin_create_workflow(
            Some(admin),
            CreateWorkflowBody {
                name: "auth".to_owned(),
                platform: Platform::Twitter,
                kind: WorkflowKind::Auth,
                steps: vec![
                    step(navigate, Some(("url", "https://twitter.com/login"))),
                    step(username, Some(("text", "{{ username }}"))),
                    step(password, Some(("text", "{{ password }}"))),
                    step(submit, None),
                    confirm_home,
                ],
                auth_workflow_id: None,
            },
        )
        .await
        .expect("auth workflow creation should succeed");

    let post = api
        .admin_create_workflow(
            Some(admin),
            CreateWorkflowBody {
                name: "post".to_owned(),
                platform: Platform::Twitter,
                kind: WorkflowKind::Action,
                steps: vec![
                    step(navigate, Some(("url", "https://twitter.com/compose/post"))),
                    step(compose, Some(("text", "{{ text }}"))),
                    step(send, None),
                ],
                auth_workflow_id: None,
            },
        )
        .await
        .expect("post workflow creation should succeed");

    (auth.id, post.id)
}
