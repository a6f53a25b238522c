//! Orchestration services for client registration and liveness.

mod registry;

pub use registry::{
    ClientRegistryError, ClientRegistryResult, ClientRegistryService, ClientSummary,
    HeartbeatRequest, RegisterClientRequest, RegisteredClient,
};
