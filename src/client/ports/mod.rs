//! Port contracts for client persistence.

mod repository;

pub use repository::{ClientRepository, ClientRepositoryError, ClientRepositoryResult};
