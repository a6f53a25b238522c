//! Given steps for job lifecycle BDD scenarios.

use super::helpers::{deploy, text, twitter_page};
use super::world::{JobLifecycleWorld, run_async};
use drover::job::domain::JobType;
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("a coordinator with a linked Twitter account")]
fn coordinator_with_account(world: &mut JobLifecycleWorld) -> Result<(), eyre::Report> {
    let deployment = run_async(deploy()).wrap_err("deploy coordinator for scenario")?;
    let (runtime, _) = deployment.runtime(twitter_page());
    world.runtime = Some(runtime);
    world.deployment = Some(deployment);
    Ok(())
}

#[given(r#"a queued post job with text "{body}""#)]
fn queued_post(world: &mut JobLifecycleWorld, body: String) -> Result<(), eyre::Report> {
    queue_post(world, &body)
}

#[given("a queued post job with {length:usize} characters of text")]
fn queued_long_post(world: &mut JobLifecycleWorld, length: usize) -> Result<(), eyre::Report> {
    queue_post(world, &"q".repeat(length))
}

fn queue_post(world: &mut JobLifecycleWorld, body: &str) -> Result<(), eyre::Report> {
    let deployment = world.deployment()?;
    let job = run_async(deployment.enqueue(JobType::Post, deployment.post_workflow, text(body)))
        .wrap_err("queue post job")?;
    world.job = Some(job);
    Ok(())
}
