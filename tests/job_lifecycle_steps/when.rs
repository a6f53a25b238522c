//! When steps for job lifecycle BDD scenarios.

use super::world::{JobLifecycleWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the agent runs the next job")]
fn agent_runs_next(world: &mut JobLifecycleWorld) -> Result<(), eyre::Report> {
    let runtime = world
        .runtime
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing agent runtime in scenario world"))?;
    let ran = run_async(runtime.run_next()).wrap_err("run next job")?;
    world.last_run = Some(ran);
    Ok(())
}

#[when("the user cancels the job")]
fn user_cancels(world: &mut JobLifecycleWorld) -> Result<(), eyre::Report> {
    let deployment = world.deployment()?;
    let job_id = world.job()?.id;
    let result = run_async(deployment.api.cancel_job(Some(&deployment.user), job_id));
    world.cancel_result = Some(result);
    Ok(())
}
