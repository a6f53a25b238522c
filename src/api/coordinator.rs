//! In-process coordinator for agents.

use super::DroverApi;
use crate::account::domain::{Account, AccountId, AuthOutcome};
use crate::agent::domain::{ClientCredentials, CoordinatorError};
use crate::agent::ports::{AgentCoordinator, CoordinatorResult};
use crate::client::domain::{Client, ClientStatus};
use crate::client::services::HeartbeatRequest;
use crate::error::ErrorKind;
use crate::job::domain::{Job, JobFailure, JobId};
use crate::platform::Platform;
use crate::workflow::domain::{ExecutionPlan, WorkflowId};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;

impl<C> DroverApi<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn authenticate_agent(&self, credentials: &ClientCredentials) -> CoordinatorResult<Client> {
        self.clients
            .authenticate(&credentials.client_id, &credentials.api_token)
            .await
            .map_err(|err| CoordinatorError::from_classified(&err))
    }

    async fn bound_account(
        &self,
        client: &Client,
        account_id: AccountId,
    ) -> CoordinatorResult<Account> {
        let account = self
            .accounts
            .find(account_id)
            .await
            .map_err(|err| CoordinatorError::from_classified(&err))?;
        if account.client_id() != client.client_id() || account.owner() != client.owner() {
            return Err(CoordinatorError::new(
                ErrorKind::NotFound,
                format!("account not found: {account_id}"),
            ));
        }
        Ok(account)
    }
}

#[async_trait]
impl<C> AgentCoordinator for DroverApi<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn heartbeat(
        &self,
        credentials: &ClientCredentials,
        status: ClientStatus,
    ) -> CoordinatorResult<()> {
        self.clients
            .heartbeat(
                &credentials.client_id,
                &credentials.api_token,
                HeartbeatRequest {
                    status: Some(status),
                    agent_version: None,
                },
            )
            .await
            .map(|_| ())
            .map_err(|err| CoordinatorError::from_classified(&err))
    }

    async fn claim(&self, credentials: &ClientCredentials) -> CoordinatorResult<Option<Job>> {
        self.authenticate_agent(credentials).await?;
        self.jobs
            .claim(&credentials.client_id)
            .await
            .map_err(|err| CoordinatorError::from_classified(&err))
    }

    async fn plan(
        &self,
        credentials: &ClientCredentials,
        workflow_id: WorkflowId,
    ) -> CoordinatorResult<ExecutionPlan> {
        self.authenticate_agent(credentials).await?;
        self.workflows
            .resolve(workflow_id)
            .await
            .map_err(|err| CoordinatorError::from_classified(&err))
    }

    async fn plan_by_name(
        &self,
        credentials: &ClientCredentials,
        platform: Platform,
        name: &str,
    ) -> CoordinatorResult<ExecutionPlan> {
        self.authenticate_agent(credentials).await?;
        self.workflows
            .resolve_by_name(platform, name)
            .await
            .map_err(|err| CoordinatorError::from_classified(&err))
    }

    async fn account(
        &self,
        credentials: &ClientCredentials,
        account_id: AccountId,
    ) -> CoordinatorResult<Account> {
        let client = self.authenticate_agent(credentials).await?;
        self.bound_account(&client, account_id).await
    }

    async fn complete(
        &self,
        credentials: &ClientCredentials,
        job_id: JobId,
        result: Option<Value>,
    ) -> CoordinatorResult<()> {
        self.authenticate_agent(credentials).await?;
        self.jobs
            .complete(job_id, &credentials.client_id, result)
            .await
            .map(|_| ())
            .map_err(|err| CoordinatorError::from_classified(&err))
    }

    async fn fail(
        &self,
        credentials: &ClientCredentials,
        job_id: JobId,
        failure: JobFailure,
    ) -> CoordinatorResult<()> {
        self.authenticate_agent(credentials).await?;
        self.jobs
            .fail(job_id, &credentials.client_id, failure)
            .await
            .map(|_| ())
            .map_err(|err| CoordinatorError::from_classified(&err))
    }

    async fn record_auth_outcome(
        &self,
        credentials: &ClientCredentials,
        account_id: AccountId,
        outcome: AuthOutcome,
    ) -> CoordinatorResult<()> {
        let client = self.authenticate_agent(credentials).await?;
        self.bound_account(&client, account_id).await?;
        self.accounts
            .record_auth_outcome(account_id, outcome)
            .await
            .map(|_| ())
            .map_err(|err| CoordinatorError::from_classified(&err))
    }
}
