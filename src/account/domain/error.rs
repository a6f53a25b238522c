//! Error types for account validation and state transitions.

use super::{AccountId, AccountStatus};
use thiserror::Error;

/// Errors returned by account construction and state transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountDomainError {
    /// The platform username is empty.
    #[error("account username must not be empty")]
    EmptyUsername,

    /// The requested status change is not allowed.
    #[error("account {account_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Account being transitioned.
        account_id: AccountId,
        /// Current status.
        from: AccountStatus,
        /// Requested status.
        to: AccountStatus,
    },
}
