//! Domain model for linked accounts and their verification state.

mod account;
mod error;
mod ids;
mod status;

pub use account::{Account, NewAccount, PersistedAccountData};
pub use error::AccountDomainError;
pub use ids::AccountId;
pub use status::{AccountStatus, AuthOutcome};
