//! Key wrapping and secret encryption services.

mod broker;

pub use broker::CredentialBroker;
