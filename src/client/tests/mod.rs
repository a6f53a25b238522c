//! Unit tests for the client registry.
