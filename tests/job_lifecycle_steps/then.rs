//! Then steps for job lifecycle BDD scenarios.

use super::world::{JobLifecycleWorld, run_async};
use rstest_bdd_macros::then;

#[then(r#"the job status is "{status}""#)]
fn job_status_is(world: &JobLifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let deployment = world.deployment()?;
    let job_id = world.job()?.id;
    let job = run_async(deployment.api.get_job(Some(&deployment.user), job_id))
        .map_err(|err| eyre::eyre!("job lookup failed: {err}"))?;
    eyre::ensure!(
        job.status.as_str() == status,
        "expected status {status}, found {}",
        job.status.as_str()
    );
    Ok(())
}

#[then("the agent found nothing to run")]
fn agent_found_nothing(world: &JobLifecycleWorld) -> Result<(), eyre::Report> {
    match world.last_run {
        Some(None) => Ok(()),
        Some(Some(id)) => Err(eyre::eyre!("agent unexpectedly ran job {id}")),
        None => Err(eyre::eyre!("the agent has not run")),
    }
}

#[then(r#"the cancellation is refused with "{message}""#)]
fn cancellation_refused(world: &JobLifecycleWorld, message: String) -> Result<(), eyre::Report> {
    let result = world
        .cancel_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing cancellation result"))?;
    match result {
        Err(err) if err.status == 400 && err.message == message => Ok(()),
        other => Err(eyre::eyre!("expected a 400 refusal, got {other:?}")),
    }
}

#[then(r#"the failure kind is "{kind}""#)]
fn failure_kind_is(world: &JobLifecycleWorld, kind: String) -> Result<(), eyre::Report> {
    let deployment = world.deployment()?;
    let job_id = world.job()?.id;
    let job = run_async(deployment.api.get_job(Some(&deployment.user), job_id))
        .map_err(|err| eyre::eyre!("job lookup failed: {err}"))?;
    let failure = job
        .last_error
        .ok_or_else(|| eyre::eyre!("job has no recorded failure"))?;
    eyre::ensure!(
        failure.kind.as_str() == kind,
        "expected failure kind {kind}, found {}",
        failure.kind.as_str()
    );
    Ok(())
}
