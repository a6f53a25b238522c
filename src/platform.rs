//! Social platforms supported by workflows, accounts, and agent adapters.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A social platform an agent can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// facebook.com
    Facebook,
    /// twitter.com / x.com
    Twitter,
    /// instagram.com
    Instagram,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: [Self; 3] = [Self::Facebook, Self::Twitter, Self::Instagram];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
        }
    }

    /// Maximum length, in characters, of text the platform accepts in a
    /// single post or reply.
    #[must_use]
    pub const fn max_text_length(self) -> usize {
        match self {
            Self::Facebook => 63_206,
            Self::Twitter => 280,
            Self::Instagram => 2_200,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Platform {
    type Error = ParsePlatformError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "facebook" => Ok(Self::Facebook),
            "twitter" | "x" => Ok(Self::Twitter),
            "instagram" => Ok(Self::Instagram),
            _ => Err(ParsePlatformError(value.to_owned())),
        }
    }
}

/// Error returned while parsing a platform name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct ParsePlatformError(pub String);
