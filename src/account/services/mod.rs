//! Orchestration services for linked accounts.

mod accounts;

pub use accounts::{AccountService, AccountServiceError, AccountServiceResult, LinkAccountRequest};
