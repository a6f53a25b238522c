//! Request bodies and response views.
//!
//! Views are built from domain values and serialize with camelCase keys.
//! Secret material only ever appears in encoded, encrypted form.

use crate::account::domain::{Account, AccountId, AccountStatus};
use crate::client::domain::{Client, ClientStatus};
use crate::client::services::ClientSummary;
use crate::job::domain::{Job, JobFailure, JobId, JobStatus, JobType};
use crate::platform::Platform;
use crate::workflow::domain::{
    ActionType, AuthSignal, ExecutionPlan, MicroAction, MicroActionId, ParamSpec, ResolvedStep,
    WorkflowId, WorkflowKind,
};
use crate::workflow::ports::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public view of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    /// Job identifier.
    pub id: JobId,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Kind of work.
    pub job_type: JobType,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time the job reached a terminal status.
    pub processed_at: Option<DateTime<Utc>>,
    /// Earliest claim time.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Expiry time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Retries consumed.
    pub retry_count: u32,
    /// Retry budget.
    pub max_retries: u32,
    /// Result reported on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Last reported failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<JobFailure>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id(),
            status: job.status(),
            job_type: job.job_type(),
            created_at: job.created_at(),
            processed_at: job.processed_at(),
            scheduled_for: job.scheduled_for(),
            expires_at: job.expires_at(),
            retry_count: job.retry_count(),
            max_retries: job.max_retries(),
            result: job.result().cloned(),
            last_error: job.last_error().cloned(),
        }
    }
}

/// Body of a job submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueJobBody {
    /// Kind of work.
    pub job_type: JobType,
    /// Workflow to run.
    pub workflow_id: WorkflowId,
    /// Account to act as.
    pub account_id: AccountId,
    /// Client that must run the job.
    pub client_id: String,
    /// Workflow template values.
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Earliest claim time.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Expiry time.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Retry budget.
    #[serde(default)]
    pub max_retries: Option<u32>,
}

/// Body of a client installation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallClientBody {
    /// Identifier chosen by the installation.
    pub client_id: String,
    /// Installed agent version.
    pub agent_version: String,
    /// Installation key, hex encoded.
    pub install_key: String,
}

/// Result of a client installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledClientView {
    /// Registered identifier.
    pub client_id: String,
    /// Api token, shown once.
    pub api_token: String,
    /// Token expiry.
    pub token_expires_at: DateTime<Utc>,
}

/// Body of a heartbeat.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatBody {
    /// Reporting client.
    pub client_id: String,
    /// Reported status.
    #[serde(default)]
    pub status: Option<ClientStatus>,
    /// Reported agent version.
    #[serde(default)]
    pub agent_version: Option<String>,
}

/// Heartbeat acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatView {
    /// Reporting client.
    pub client_id: String,
    /// Recorded status.
    pub status: ClientStatus,
    /// Recorded heartbeat time.
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl From<&Client> for HeartbeatView {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.client_id().to_string(),
            status: client.status(),
            last_heartbeat: client.last_heartbeat(),
        }
    }
}

/// Listing entry for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    /// Client identifier.
    pub client_id: String,
    /// Status, `offline` when stale.
    pub status: ClientStatus,
    /// Whether the client may claim jobs.
    pub live: bool,
    /// Installed agent version.
    pub agent_version: String,
    /// Last heartbeat.
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Token expiry.
    pub token_expires_at: DateTime<Utc>,
}

impl From<&ClientSummary> for ClientView {
    fn from(summary: &ClientSummary) -> Self {
        Self {
            client_id: summary.client.client_id().to_string(),
            status: summary.effective_status,
            live: summary.live,
            agent_version: summary.client.agent_version().to_owned(),
            last_heartbeat: summary.client.last_heartbeat(),
            token_expires_at: summary.client.token_expires_at(),
        }
    }
}

/// A client key wrapped for the caller's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionKeyView {
    /// Client whose key this is.
    pub client_id: String,
    /// Wrapped key, base64 encoded.
    pub wrapped_key: String,
}

/// Body of an account link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAccountBody {
    /// Platform of the account.
    pub platform: Platform,
    /// Login name.
    pub username: String,
    /// Client whose key encrypted the secret.
    pub client_id: String,
    /// Secret encrypted under the client key, base64 encoded.
    pub encrypted_secret: String,
}

/// Body of an account verification request.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyAccountBody {
    /// Account to verify.
    #[serde(alias = "accountId")]
    pub account_id: AccountId,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    /// Account identifier.
    pub id: AccountId,
    /// Platform.
    pub platform: Platform,
    /// Login name.
    pub username: String,
    /// Verification status.
    pub status: AccountStatus,
    /// Last successful login.
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            platform: account.platform(),
            username: account.username().to_owned(),
            status: account.status(),
            last_verified_at: account.last_verified_at(),
        }
    }
}

/// Declared micro-action parameter in a request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpecBody {
    /// Parameter name.
    pub name: String,
    /// Whether a value is required.
    #[serde(default)]
    pub required: bool,
    /// Default value.
    #[serde(default)]
    pub default: Option<Value>,
}

impl From<ParamSpecBody> for ParamSpec {
    fn from(body: ParamSpecBody) -> Self {
        Self {
            name: body.name,
            required: body.required,
            default: body.default,
        }
    }
}

/// Body of a micro-action registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMicroActionBody {
    /// Catalog name.
    pub name: String,
    /// Interaction kind.
    pub action_type: ActionType,
    /// Target platform.
    pub platform: Platform,
    /// Element selector.
    #[serde(default)]
    pub target: Option<String>,
    /// Declared parameters.
    #[serde(default)]
    pub params: Vec<ParamSpecBody>,
}

/// Public view of a micro-action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroActionView {
    /// Identifier.
    pub id: MicroActionId,
    /// Catalog name.
    pub name: String,
    /// Interaction kind.
    pub action_type: ActionType,
    /// Target platform.
    pub platform: Platform,
    /// Element selector.
    pub target: Option<String>,
    /// Declared parameter names.
    pub params: Vec<String>,
}

impl From<&MicroAction> for MicroActionView {
    fn from(action: &MicroAction) -> Self {
        Self {
            id: action.id(),
            name: action.name().to_owned(),
            action_type: action.action_type(),
            platform: action.platform(),
            target: action.target().map(str::to_owned),
            params: action.params().iter().map(|spec| spec.name.clone()).collect(),
        }
    }
}

/// A workflow step in a request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStepBody {
    /// Referenced micro-action.
    pub micro_action_id: MicroActionId,
    /// Step parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Meaning of the step failing.
    #[serde(default)]
    pub auth_signal: Option<AuthSignal>,
}

/// Body of a workflow creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowBody {
    /// Canonical name.
    pub name: String,
    /// Target platform.
    pub platform: Platform,
    /// Auth or action.
    #[serde(rename = "type")]
    pub kind: WorkflowKind,
    /// Ordered steps.
    pub steps: Vec<WorkflowStepBody>,
    /// Auth workflow run first.
    #[serde(default)]
    pub auth_workflow_id: Option<WorkflowId>,
}

/// Body of a partial workflow update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowBody {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement steps.
    #[serde(default)]
    pub steps: Option<Vec<WorkflowStepBody>>,
    /// Replacement auth workflow.
    #[serde(default)]
    pub auth_workflow_id: Option<WorkflowId>,
}

/// Filters and pagination for the admin workflow listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowQuery {
    /// Only this platform.
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Only this kind.
    #[serde(default, rename = "type")]
    pub kind: Option<WorkflowKind>,
    /// Include deactivated workflows.
    #[serde(default)]
    pub include_inactive: bool,
    /// One-based page number.
    #[serde(default = "first_page")]
    pub page: usize,
    /// Page size.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

const fn first_page() -> usize {
    1
}

const fn default_per_page() -> usize {
    20
}

impl Default for WorkflowQuery {
    fn default() -> Self {
        Self {
            platform: None,
            kind: None,
            include_inactive: false,
            page: first_page(),
            per_page: default_per_page(),
        }
    }
}

/// A workflow step with its micro-action inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    /// Zero-based position.
    pub index: usize,
    /// Inlined micro-action.
    pub micro_action: MicroActionView,
    /// Step parameters.
    pub params: Map<String, Value>,
    /// Meaning of the step failing.
    pub auth_signal: Option<AuthSignal>,
}

impl From<&ResolvedStep> for StepView {
    fn from(step: &ResolvedStep) -> Self {
        Self {
            index: step.index,
            micro_action: MicroActionView::from(&step.action),
            params: step.params.clone(),
            auth_signal: step.auth_signal,
        }
    }
}

/// Public view of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowView {
    /// Identifier.
    pub id: WorkflowId,
    /// Canonical name.
    pub name: String,
    /// Target platform.
    pub platform: Platform,
    /// Auth or action.
    #[serde(rename = "type")]
    pub kind: WorkflowKind,
    /// Whether a login runs first.
    pub requires_auth: bool,
    /// Auth workflow run first.
    pub auth_workflow_id: Option<WorkflowId>,
    /// Whether the workflow can run.
    pub is_active: bool,
    /// Enriched steps.
    pub steps: Vec<StepView>,
}

impl From<&ExecutionPlan> for WorkflowView {
    fn from(plan: &ExecutionPlan) -> Self {
        Self {
            id: plan.workflow_id,
            name: plan.name.to_string(),
            platform: plan.platform,
            kind: plan.kind,
            requires_auth: plan.requires_auth,
            auth_workflow_id: plan.auth_workflow_id,
            is_active: plan.is_active,
            steps: plan.steps.iter().map(StepView::from).collect(),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matching items.
    pub total: usize,
    /// One-based page number.
    pub page: usize,
    /// Page size.
    pub per_page: usize,
}

impl<T> PageView<T> {
    /// Converts a repository page.
    #[expect(
        clippy::integer_division,
        reason = "page numbers are whole offsets divided by the page size"
    )]
    pub fn from_page<U>(page: Page<U>, view: impl FnMut(U) -> T) -> Self {
        let request = page.request;
        let per_page = request.limit();
        Self {
            page: request.offset() / per_page + 1,
            per_page,
            total: page.total,
            items: page.items.into_iter().map(view).collect(),
        }
    }
}
