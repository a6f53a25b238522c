//! Account verification status and auth outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verification status of a linked account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Waiting for an auth run to confirm the credentials.
    PendingVerification,
    /// Credentials confirmed by the last auth run.
    Active,
    /// The platform rejected the credentials.
    LoginFailed,
    /// The platform demands a fresh login (checkpoint, expired session).
    NeedsReauth,
}

impl AccountStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingVerification => "pending_verification",
            Self::Active => "active",
            Self::LoginFailed => "login_failed",
            Self::NeedsReauth => "needs_reauth",
        }
    }

    /// Returns whether a transition from `self` to `target` is permitted.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::PendingVerification, Self::Active | Self::LoginFailed)
                | (Self::Active, Self::LoginFailed | Self::NeedsReauth)
                | (Self::LoginFailed | Self::NeedsReauth, Self::PendingVerification)
        )
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an auth workflow run, as reported by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
    /// Login succeeded.
    Verified,
    /// The platform rejected the username or password.
    CredentialsRejected,
    /// The platform asked for re-authentication.
    ReauthRequired,
}

impl AuthOutcome {
    /// Returns the status this outcome moves an account into.
    ///
    /// A pending account cannot jump to `needs_reauth`; a re-auth demand
    /// during verification counts as a failed login.
    #[must_use]
    pub const fn target_status(self, current: AccountStatus) -> AccountStatus {
        match (self, current) {
            (Self::Verified, _) => AccountStatus::Active,
            (Self::ReauthRequired, AccountStatus::Active | AccountStatus::NeedsReauth) => {
                AccountStatus::NeedsReauth
            }
            (Self::CredentialsRejected | Self::ReauthRequired, _) => AccountStatus::LoginFailed,
        }
    }
}
