//! Server side of the agent protocol.

use crate::account::domain::{Account, AccountId, AuthOutcome};
use crate::agent::domain::{ClientCredentials, CoordinatorError};
use crate::client::domain::ClientStatus;
use crate::job::domain::{Job, JobFailure, JobId};
use crate::platform::Platform;
use crate::workflow::domain::{ExecutionPlan, WorkflowId};
use async_trait::async_trait;
use serde_json::Value;

/// Result type for coordinator calls.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Everything an agent asks of the coordinator.
///
/// Every call authenticates with the client's credentials.
#[async_trait]
pub trait AgentCoordinator: Send + Sync {
    /// Reports liveness.
    async fn heartbeat(
        &self,
        credentials: &ClientCredentials,
        status: ClientStatus,
    ) -> CoordinatorResult<()>;

    /// Claims the next job addressed to this client, if any.
    async fn claim(&self, credentials: &ClientCredentials) -> CoordinatorResult<Option<Job>>;

    /// Resolves a workflow into an execution plan.
    async fn plan(
        &self,
        credentials: &ClientCredentials,
        workflow_id: WorkflowId,
    ) -> CoordinatorResult<ExecutionPlan>;

    /// Resolves the active workflow with a canonical name.
    async fn plan_by_name(
        &self,
        credentials: &ClientCredentials,
        platform: Platform,
        name: &str,
    ) -> CoordinatorResult<ExecutionPlan>;

    /// Fetches an account bound to this client.
    async fn account(
        &self,
        credentials: &ClientCredentials,
        account_id: AccountId,
    ) -> CoordinatorResult<Account>;

    /// Marks a claimed job completed.
    async fn complete(
        &self,
        credentials: &ClientCredentials,
        job_id: JobId,
        result: Option<Value>,
    ) -> CoordinatorResult<()>;

    /// Reports a claimed job as failed.
    async fn fail(
        &self,
        credentials: &ClientCredentials,
        job_id: JobId,
        failure: JobFailure,
    ) -> CoordinatorResult<()>;

    /// Applies the outcome of a login attempt to an account.
    async fn record_auth_outcome(
        &self,
        credentials: &ClientCredentials,
        account_id: AccountId,
        outcome: AuthOutcome,
    ) -> CoordinatorResult<()>;
}
