//! Unit tests for the job queue.

mod service_tests;
