//! Unit tests for the behaviour layer.

mod human_tests;
