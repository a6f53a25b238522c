//! Account verification through an auth job.

use super::helpers::{deploy, twitter_page};
use drover::account::domain::AccountStatus;
use drover::api::VerifyAccountBody;
use drover::job::domain::JobStatus;

#[tokio::test(flavor = "multi_thread")]
async fn verified_login_activates_a_pending_account() -> Result<(), eyre::Report> {
    let deployment = deploy().await?;
    let queued = deployment
        .api
        .verify_account(
            Some(&deployment.user),
            VerifyAccountBody {
                account_id: deployment.account_id,
            },
        )
        .await
        .map_err(|err| eyre::eyre!("verification rejected: {err}"))?;
    let (runtime, launcher) = deployment.runtime(twitter_page());

    let ran = runtime.run_next().await?;

    let job = deployment
        .api
        .get_job(Some(&deployment.user), queued.id)
        .await
        .map_err(|err| eyre::eyre!("job lookup failed: {err}"))?;
    let accounts = deployment
        .api
        .list_accounts(Some(&deployment.user))
        .await
        .map_err(|err| eyre::eyre!("account listing failed: {err}"))?;
    let account = accounts
        .iter()
        .find(|account| account.id == deployment.account_id)
        .ok_or_else(|| eyre::eyre!("linked account missing"))?;

    eyre::ensure!(ran == Some(queued.id), "the verification job should run");
    eyre::ensure!(
        job.status == JobStatus::Completed,
        "job should complete, found {:?}",
        job.status
    );
    eyre::ensure!(
        account.status == AccountStatus::Active,
        "account should be active, found {:?}",
        account.status
    );
    eyre::ensure!(account.last_verified_at.is_some(), "verification time missing");
    eyre::ensure!(launcher.launches() == 1, "exactly one page should open");
    eyre::ensure!(
        launcher.page().typed_text() == "drover_e2ehunter2",
        "agent should type the decrypted credentials"
    );
    Ok(())
}
