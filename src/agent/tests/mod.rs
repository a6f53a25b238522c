//! Unit and service tests for the agent runtime.

mod capability_tests;
