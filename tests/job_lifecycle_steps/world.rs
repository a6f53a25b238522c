//! Shared world state for job lifecycle BDD scenarios.

use super::helpers::Deployment;
use drover::agent::adapters::SimulatedLauncher;
use drover::agent::services::AgentRuntime;
use drover::api::{ApiError, JobView};
use drover::job::domain::JobId;
use rstest::fixture;

/// Scenario world for job lifecycle behaviour tests.
#[derive(Default)]
pub struct JobLifecycleWorld {
    pub deployment: Option<Deployment>,
    pub runtime: Option<AgentRuntime<SimulatedLauncher>>,
    pub job: Option<JobView>,
    pub last_run: Option<Option<JobId>>,
    pub cancel_result: Option<Result<JobView, ApiError>>,
}

impl JobLifecycleWorld {
    /// Returns the deployment or a scenario setup error.
    ///
    /// # Errors
    ///
    /// Returns an error when the background step has not run.
    pub fn deployment(&self) -> Result<&Deployment, eyre::Report> {
        self.deployment
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing deployment in scenario world"))
    }

    /// Returns the job under test.
    ///
    /// # Errors
    ///
    /// Returns an error when no job has been queued.
    pub fn job(&self) -> Result<&JobView, eyre::Report> {
        self.job
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing job in scenario world"))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> JobLifecycleWorld {
    JobLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
