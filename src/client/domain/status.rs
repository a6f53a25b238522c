//! Client activity status reported in heartbeats.

use super::ClientDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-reported client activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// Connected and ready for work.
    Online,
    /// Connected and running a job.
    Busy,
    /// Connected with no browser session open.
    Idle,
    /// Not connected; also reported for clients whose heartbeat is stale.
    Offline,
}

impl ClientStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Busy => "busy",
            Self::Idle => "idle",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ClientStatus {
    type Error = ClientDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "online" | "active" => Ok(Self::Online),
            "busy" => Ok(Self::Busy),
            "idle" => Ok(Self::Idle),
            "offline" => Ok(Self::Offline),
            _ => Err(ClientDomainError::UnknownStatus(value.to_owned())),
        }
    }
}
