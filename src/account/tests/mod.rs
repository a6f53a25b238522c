//! Unit tests for linked accounts.
