//! Behaviour tests for the job lifecycle across coordinator and agent.

#[path = "job_lifecycle_steps/mod.rs"]
mod job_lifecycle_steps_defs;

use job_lifecycle_steps_defs::world::{JobLifecycleWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "An agent completes a queued post"
)]
#[tokio::test(flavor = "multi_thread")]
async fn agent_completes_a_queued_post(world: JobLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "A cancelled job is never claimed"
)]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_job_is_never_claimed(world: JobLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "Cancelling a finished job is refused"
)]
#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_finished_job_is_refused(world: JobLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "An overlong post fails validation"
)]
#[tokio::test(flavor = "multi_thread")]
async fn overlong_post_fails_validation(world: JobLifecycleWorld) {
    let _ = world;
}
