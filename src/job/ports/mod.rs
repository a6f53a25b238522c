//! Port contracts for job persistence and claim eligibility.

mod eligibility;
mod repository;

pub use eligibility::{ClaimEligibility, EligibilityError};
pub use repository::{JobRepository, JobRepositoryError, JobRepositoryResult};
