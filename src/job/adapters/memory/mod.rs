//! In-memory job storage for tests and single-process deployments.

mod job;

pub use job::InMemoryJobRepository;
