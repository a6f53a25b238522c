//! Unit tests for workflow definitions and resolution.
