//! Requests rejected before any browser work.

use super::helpers::{deploy, text, twitter_page};
use drover::error::ErrorKind;
use drover::job::domain::{JobStatus, JobType};

#[tokio::test(flavor = "multi_thread")]
async fn overlong_twitter_post_fails_without_touching_the_browser() -> Result<(), eyre::Report> {
    let deployment = deploy().await?;
    let queued = deployment
        .enqueue(JobType::Post, deployment.post_workflow, text(&"z".repeat(281)))
        .await?;
    let (runtime, launcher) = deployment.runtime(twitter_page());

    runtime.run_next().await?;

    let job = deployment
        .api
        .get_job(Some(&deployment.user), queued.id)
        .await
        .map_err(|err| eyre::eyre!("job lookup failed: {err}"))?;
    let failure = job
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("failure should be recorded"))?;

    eyre::ensure!(job.status == JobStatus::Failed, "job should fail terminally");
    eyre::ensure!(failure.kind == ErrorKind::Validation, "failure should be validation");
    eyre::ensure!(job.retry_count == 0, "validation failures spend no retries");
    eyre::ensure!(
        runtime.behavior_invocations() == 0,
        "no humanized interaction should run"
    );
    eyre::ensure!(launcher.launches() == 0, "no page should open");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn post_at_the_limit_is_published() -> Result<(), eyre::Report> {
    let deployment = deploy().await?;
    let body = "z".repeat(280);
    let queued = deployment
        .enqueue(JobType::Post, deployment.post_workflow, text(&body))
        .await?;
    let (runtime, launcher) = deployment.runtime(twitter_page());

    runtime.run_next().await?;

    let job = deployment
        .api
        .get_job(Some(&deployment.user), queued.id)
        .await
        .map_err(|err| eyre::eyre!("job lookup failed: {err}"))?;
    eyre::ensure!(job.status == JobStatus::Completed, "job should complete");
    eyre::ensure!(launcher.page().typed_text() == body, "full text should be typed");
    Ok(())
}
