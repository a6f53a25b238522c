//! Unit tests for key wrapping and secret encryption.
