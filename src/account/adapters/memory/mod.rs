//! In-memory account storage.

mod account;

pub use account::InMemoryAccountRepository;
