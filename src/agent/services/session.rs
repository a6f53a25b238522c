//! Friendly per-account calls mapped onto canonical workflows.

use crate::account::domain::AccountId;
use crate::agent::domain::{AgentResult, PlatformAgent, RunReport};
use crate::agent::ports::BrowserLauncher;
use crate::agent::services::AgentRuntime;
use crate::job::domain::JobType;
use serde_json::{Map, Value};

/// Acts as one account on one platform.
pub struct AgentSession<'a, L: BrowserLauncher> {
    runtime: &'a AgentRuntime<L>,
    agent: PlatformAgent,
    account_id: AccountId,
}

impl<'a, L: BrowserLauncher> AgentSession<'a, L> {
    pub(crate) const fn new(
        runtime: &'a AgentRuntime<L>,
        agent: PlatformAgent,
        account_id: AccountId,
    ) -> Self {
        Self {
            runtime,
            agent,
            account_id,
        }
    }

    /// Returns the platform adapter in use.
    #[must_use]
    pub const fn agent(&self) -> PlatformAgent {
        self.agent
    }

    /// Logs in and verifies the account.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::domain::AgentError`] when the run fails.
    pub async fn login(&self) -> AgentResult<RunReport> {
        self.run(JobType::Auth, Map::new()).await
    }

    /// Publishes a post.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::domain::AgentError::TextTooLong`] before any
    /// page is opened when `text` exceeds the platform limit.
    pub async fn post(&self, text: &str) -> AgentResult<RunReport> {
        self.run(JobType::Post, params([("text", text)])).await
    }

    /// Reacts to a post.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::domain::AgentError`] when the run fails.
    pub async fn react(&self, post_url: &str) -> AgentResult<RunReport> {
        self.run(JobType::React, params([("post_url", post_url)]))
            .await
    }

    /// Replies to a post.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::domain::AgentError`] when the run fails.
    pub async fn reply(&self, post_url: &str, text: &str) -> AgentResult<RunReport> {
        self.run(
            JobType::Reply,
            params([("post_url", post_url), ("text", text)]),
        )
        .await
    }

    /// Follows a profile.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::domain::AgentError`] when the run fails.
    pub async fn follow(&self, profile_url: &str) -> AgentResult<RunReport> {
        self.run(JobType::Follow, params([("profile_url", profile_url)]))
            .await
    }

    /// Reposts a post.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::domain::AgentError::Unsupported`] on
    /// platforms without reposts.
    pub async fn retweet(&self, post_url: &str) -> AgentResult<RunReport> {
        self.run(JobType::Retweet, params([("post_url", post_url)]))
            .await
    }

    async fn run(&self, capability: JobType, params: Map<String, Value>) -> AgentResult<RunReport> {
        self.agent.validate(capability, &params)?;
        self.runtime
            .run_workflow(
                self.agent.platform(),
                self.account_id,
                PlatformAgent::workflow_name(capability),
                params,
            )
            .await
    }
}

fn params<const N: usize>(pairs: [(&str, &str); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_owned(), Value::from(value)))
        .collect()
}
