//! Domain model for registered agent clients.

mod client;
mod error;
mod ids;
mod status;
mod token;

pub use client::{CachedWrappedKey, Client, NewClient, PersistedClientData};
pub use error::ClientDomainError;
pub use ids::ClientId;
pub use status::ClientStatus;
pub use token::{ApiToken, TokenHash};
