//! Port contracts for workflow and micro-action storage.

pub mod repository;

pub use repository::{
    MicroActionRepository, Page, PageRequest, WorkflowFilter, WorkflowRepository,
    WorkflowRepositoryError, WorkflowRepositoryResult,
};
