//! Claims jobs and runs their workflows through the behaviour layer.

use crate::account::domain::{Account, AccountId, AuthOutcome};
use crate::agent::domain::{
    AgentError, AgentIdentity, AgentResult, PlatformAgent, PreparedStep, RunReport, StepCommand,
    StepFailureReason,
};
use crate::agent::ports::{AgentCoordinator, BrowserLauncher};
use crate::agent::services::AgentSession;
use crate::behavior::domain::StealthProfile;
use crate::behavior::ports::{Pacer, PageResult};
use crate::behavior::services::HumanPage;
use crate::config::BehaviorConfig;
use crate::credential::services::CredentialBroker;
use crate::error::Classify;
use crate::job::domain::{Job, JobId, JobType};
use crate::platform::Platform;
use crate::workflow::domain::{ExecutionPlan, WorkflowKind};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Executes jobs for one client.
///
/// Each run opens its own page and stealth profile. Steps run strictly in
/// order and the first failure ends the run without rollback.
pub struct AgentRuntime<L: BrowserLauncher> {
    coordinator: Arc<dyn AgentCoordinator>,
    launcher: Arc<L>,
    identity: AgentIdentity,
    pacer: Arc<dyn Pacer>,
    config: BehaviorConfig,
    invocations: Arc<AtomicUsize>,
}

impl<L: BrowserLauncher> AgentRuntime<L> {
    /// Creates a runtime.
    pub fn new(
        coordinator: Arc<dyn AgentCoordinator>,
        launcher: Arc<L>,
        identity: AgentIdentity,
        pacer: Arc<dyn Pacer>,
        config: BehaviorConfig,
    ) -> Self {
        Self {
            coordinator,
            launcher,
            identity,
            pacer,
            config,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the agent identity.
    pub const fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Returns the coordinator this runtime reports to.
    pub const fn coordinator(&self) -> &Arc<dyn AgentCoordinator> {
        &self.coordinator
    }

    /// Returns how many humanized page interactions all runs performed.
    pub fn behavior_invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Returns a handle for friendly calls on behalf of one account.
    pub const fn session(&self, platform: Platform, account_id: AccountId) -> AgentSession<'_, L> {
        AgentSession::new(self, PlatformAgent::for_platform(platform), account_id)
    }

    /// Claims and runs the next job, reporting its outcome.
    ///
    /// Returns `None` when nothing was claimable.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Coordinator`] when claiming or reporting fails.
    /// Run failures are reported on the job, not returned.
    pub async fn run_next(&self) -> AgentResult<Option<JobId>> {
        let credentials = &self.identity.credentials;
        let Some(job) = self.coordinator.claim(credentials).await? else {
            return Ok(None);
        };
        let job_id = job.id();
        tracing::info!(job_id = %job_id, job_type = %job.job_type(), "running job");
        match self.execute(&job).await {
            Ok(report) => {
                self.coordinator
                    .complete(credentials, job_id, Some(report.to_json()))
                    .await?;
                tracing::info!(job_id = %job_id, steps = report.steps_completed, "job completed");
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, kind = %err.kind(), error = %err, "job failed");
                self.coordinator
                    .fail(credentials, job_id, err.to_failure())
                    .await?;
            }
        }
        Ok(Some(job_id))
    }

    /// Runs a claimed job without reporting its outcome on the job.
    ///
    /// Login outcomes are still applied to the account.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when validation, lookup, or a step fails.
    pub async fn execute(&self, job: &Job) -> AgentResult<RunReport> {
        let payload = job.payload();
        let credentials = &self.identity.credentials;
        let plan = self.coordinator.plan(credentials, payload.workflow_id).await?;
        let account = self
            .coordinator
            .account(credentials, payload.account_id)
            .await?;
        self.run_and_record(Some(job.job_type()), &plan, &account, payload.params.clone())
            .await
    }

    /// Runs the active workflow named `name` for an account.
    ///
    /// When `name` is a capability name, the request is validated against
    /// the platform's capability set first.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when validation, lookup, or a step fails.
    pub async fn run_workflow(
        &self,
        platform: Platform,
        account_id: AccountId,
        name: &str,
        params: Map<String, Value>,
    ) -> AgentResult<RunReport> {
        let credentials = &self.identity.credentials;
        let plan = self
            .coordinator
            .plan_by_name(credentials, platform, name)
            .await?;
        let account = self.coordinator.account(credentials, account_id).await?;
        let capability = JobType::try_from(name).ok();
        self.run_and_record(capability, &plan, &account, params)
            .await
    }

    async fn run_and_record(
        &self,
        capability: Option<JobType>,
        plan: &ExecutionPlan,
        account: &Account,
        params: Map<String, Value>,
    ) -> AgentResult<RunReport> {
        let result = self.run_plan(capability, plan, account, params).await;
        let outcome = match &result {
            Ok(_) if plan.kind == WorkflowKind::Auth => Some(AuthOutcome::Verified),
            Ok(_) => None,
            Err(err) => err.auth_outcome(),
        };
        let Some(outcome) = outcome else {
            return result;
        };
        let recorded = self
            .coordinator
            .record_auth_outcome(&self.identity.credentials, account.id(), outcome)
            .await;
        if let Err(err) = &recorded {
            tracing::warn!(
                account_id = %account.id(),
                outcome = ?outcome,
                error = %err,
                "could not record auth outcome"
            );
        }
        // An auth run only succeeds once the account reflects it.
        match (result, recorded) {
            (Ok(_), Err(err)) => Err(AgentError::Coordinator(err)),
            (run, _) => run,
        }
    }

    async fn run_plan(
        &self,
        capability: Option<JobType>,
        plan: &ExecutionPlan,
        account: &Account,
        params: Map<String, Value>,
    ) -> AgentResult<RunReport> {
        if account.platform() != plan.platform {
            return Err(AgentError::PlatformMismatch {
                account: account.platform(),
                workflow: plan.platform,
            });
        }
        if let Some(capability) = capability {
            PlatformAgent::for_platform(plan.platform).validate(capability, &params)?;
        }

        let login = match plan.auth_workflow_id {
            Some(auth_id) if plan.requires_auth && plan.kind == WorkflowKind::Action => Some(
                self.coordinator
                    .plan(&self.identity.credentials, auth_id)
                    .await?,
            ),
            _ => None,
        };

        let mut context = params;
        if plan.kind == WorkflowKind::Auth || login.is_some() {
            let password =
                CredentialBroker::decrypt_secret(&self.identity.client_key, account.encrypted_secret())?;
            context.insert("username".to_owned(), Value::from(account.username()));
            context.insert("password".to_owned(), Value::from(password));
        }

        let wait = (self.config.step_pause_min_ms, self.config.step_pause_max_ms);
        let mut steps = Vec::new();
        for source in login.iter().chain(std::iter::once(plan)) {
            for step in &source.steps {
                steps.push(PreparedStep::prepare(step, &context, wait)?);
            }
        }

        let page = self
            .launcher
            .launch(plan.platform)
            .await
            .map_err(|err| AgentError::session(&err))?;
        let human = HumanPage::new(page, Arc::clone(&self.pacer), self.config.clone())
            .with_invocation_counter(Arc::clone(&self.invocations));
        let profile = StealthProfile::randomized(&mut rand::thread_rng());
        human
            .apply_stealth(&profile)
            .await
            .map_err(|err| AgentError::session(&err))?;

        for step in &steps {
            tracing::debug!(step = step.index, action = %step.action, "running step");
            if let Err(err) = run_command(&human, &step.command).await {
                tracing::warn!(step = step.index, action = %step.action, error = %err, "step failed");
                return Err(AgentError::Step {
                    index: step.index,
                    action: step.action.clone(),
                    reason: StepFailureReason::from(&err),
                    auth_signal: step.auth_signal,
                });
            }
        }

        Ok(RunReport {
            workflow_id: plan.workflow_id,
            workflow: plan.name.clone(),
            steps_completed: steps.len(),
        })
    }
}

async fn run_command<P>(human: &HumanPage<P>, command: &StepCommand) -> PageResult<()>
where
    P: crate::behavior::ports::BrowserPage,
{
    match command {
        StepCommand::Navigate { url } => human.navigate(url).await,
        StepCommand::Click { target } => {
            human.click(target).await?;
            human.think().await;
            Ok(())
        }
        StepCommand::Type { target, text } => {
            human.click(target).await?;
            human.type_text(text).await?;
            human.think().await;
            Ok(())
        }
        StepCommand::Scroll { delta } => human.scroll(*delta).await,
        StepCommand::Wait { min_ms, max_ms } => {
            human.pause_between(*min_ms, *max_ms).await;
            Ok(())
        }
        StepCommand::WaitForSelector { target } => human.wait_for(target).await,
        StepCommand::AssertUrl { contains } => human.assert_url(contains).await,
    }
}
