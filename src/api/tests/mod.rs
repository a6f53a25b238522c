//! Facade and in-process coordinator tests.

pub(crate) mod harness;

mod coordinator_tests;
mod facade_tests;
