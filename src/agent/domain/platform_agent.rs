//! Per-platform capability sets and pre-dispatch validation.

use super::AgentError;
use crate::job::domain::JobType;
use crate::platform::Platform;
use serde_json::{Map, Value};

/// Platform adapter variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformAgent {
    /// Facebook.
    Facebook,
    /// Twitter.
    Twitter,
    /// Instagram.
    Instagram,
}

const FACEBOOK: &[JobType] = &[
    JobType::Auth,
    JobType::Post,
    JobType::React,
    JobType::Reply,
    JobType::Follow,
];
const TWITTER: &[JobType] = &[
    JobType::Auth,
    JobType::Post,
    JobType::React,
    JobType::Reply,
    JobType::Follow,
    JobType::Retweet,
];
const INSTAGRAM: &[JobType] = &[
    JobType::Auth,
    JobType::Post,
    JobType::React,
    JobType::Reply,
    JobType::Follow,
];

impl PlatformAgent {
    /// Returns the adapter for a platform.
    #[must_use]
    pub const fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Facebook => Self::Facebook,
            Platform::Twitter => Self::Twitter,
            Platform::Instagram => Self::Instagram,
        }
    }

    /// Returns the platform this adapter drives.
    #[must_use]
    pub const fn platform(self) -> Platform {
        match self {
            Self::Facebook => Platform::Facebook,
            Self::Twitter => Platform::Twitter,
            Self::Instagram => Platform::Instagram,
        }
    }

    /// Returns the job types this adapter can run.
    #[must_use]
    pub const fn capabilities(self) -> &'static [JobType] {
        match self {
            Self::Facebook => FACEBOOK,
            Self::Twitter => TWITTER,
            Self::Instagram => INSTAGRAM,
        }
    }

    /// Whether this adapter can run `capability`.
    #[must_use]
    pub fn supports(self, capability: JobType) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Returns the canonical workflow name for a capability.
    #[must_use]
    pub const fn workflow_name(capability: JobType) -> &'static str {
        capability.as_str()
    }

    /// Names the job parameters a capability requires.
    #[must_use]
    pub const fn required_params(capability: JobType) -> &'static [&'static str] {
        match capability {
            JobType::Auth => &[],
            JobType::Post => &["text"],
            JobType::React | JobType::Retweet => &["post_url"],
            JobType::Reply => &["post_url", "text"],
            JobType::Follow => &["profile_url"],
        }
    }

    /// Checks a request against the capability set and platform limits.
    ///
    /// Runs before any browser session is opened.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Unsupported`] for a capability the platform
    /// lacks, [`AgentError::MissingParam`] when a required parameter is
    /// absent or blank, or [`AgentError::TextTooLong`] when `text` exceeds
    /// the platform limit.
    pub fn validate(
        self,
        capability: JobType,
        params: &Map<String, Value>,
    ) -> Result<(), AgentError> {
        if !self.supports(capability) {
            return Err(AgentError::Unsupported {
                platform: self.platform(),
                capability,
            });
        }
        for name in Self::required_params(capability) {
            let present = params
                .get(*name)
                .and_then(Value::as_str)
                .is_some_and(|value| !value.trim().is_empty());
            if !present {
                return Err(AgentError::MissingParam((*name).to_owned()));
            }
        }
        if let Some(text) = params.get("text").and_then(Value::as_str) {
            let length = text.chars().count();
            let max = self.platform().max_text_length();
            if length > max {
                return Err(AgentError::TextTooLong {
                    platform: self.platform(),
                    length,
                    max,
                });
            }
        }
        Ok(())
    }
}

impl From<Platform> for PlatformAgent {
    fn from(platform: Platform) -> Self {
        Self::for_platform(platform)
    }
}
