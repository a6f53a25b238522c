//! Runtime configuration for the coordinator and agent workers.
//!
//! Every section has sensible defaults so an empty TOML document is a valid
//! configuration.
//!
//! # Examples
//!
//! ```
//! use drover::config::DroverConfig;
//!
//! let config = DroverConfig::from_toml_str("[jobs]\ndefault_max_retries = 5\n")
//!     .expect("valid configuration");
//! assert_eq!(config.jobs.default_max_retries, 5);
//! assert_eq!(config.clients.staleness_threshold_secs, 90);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why the value is rejected.
        reason: &'static str,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroverConfig {
    /// Job queue settings.
    pub jobs: JobQueueConfig,
    /// Client registry settings.
    pub clients: ClientRegistryConfig,
    /// Human-behaviour timing settings.
    pub behavior: BehaviorConfig,
    /// Agent worker loop settings.
    pub worker: WorkerConfig,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

impl DroverConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or
    /// [`ConfigError::InvalidValue`] when a range is inverted or empty.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clients.staleness_threshold_secs <= self.clients.heartbeat_interval_secs {
            return Err(ConfigError::InvalidValue {
                field: "clients.staleness_threshold_secs",
                reason: "must exceed the heartbeat interval",
            });
        }
        if self.behavior.step_pause_min_ms > self.behavior.step_pause_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "behavior.step_pause_min_ms",
                reason: "must not exceed step_pause_max_ms",
            });
        }
        if self.behavior.scroll_pause_min_ms > self.behavior.scroll_pause_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "behavior.scroll_pause_min_ms",
                reason: "must not exceed scroll_pause_max_ms",
            });
        }
        if self.clients.heartbeat_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "clients.heartbeat_interval_secs",
                reason: "must be positive",
            });
        }
        if self.worker.claim_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.claim_interval_secs",
                reason: "must be positive",
            });
        }
        if self.jobs.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "jobs.sweep_interval_secs",
                reason: "must be positive",
            });
        }
        if self.jobs.claim_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "jobs.claim_batch_size",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// Converts whole seconds into a `chrono` duration, saturating on overflow.
#[must_use]
pub fn seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

/// Job queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQueueConfig {
    /// Retry budget for new jobs.
    pub default_max_retries: u32,
    /// Lifetime of a job from its scheduled time until it expires.
    pub default_ttl_secs: u64,
    /// Period of the expiry sweeper.
    pub sweep_interval_secs: u64,
    /// Candidates examined per claim attempt.
    pub claim_batch_size: usize,
}

impl JobQueueConfig {
    /// Returns the default job lifetime.
    #[must_use]
    pub fn default_ttl(&self) -> chrono::Duration {
        seconds(self.default_ttl_secs)
    }

    /// Returns the sweeper period.
    #[must_use]
    pub const fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            default_max_retries: 3,
            default_ttl_secs: 24 * 60 * 60,
            sweep_interval_secs: 60,
            claim_batch_size: 16,
        }
    }
}

/// Client registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientRegistryConfig {
    /// Lifetime of an issued api token.
    pub token_ttl_secs: u64,
    /// A client whose last heartbeat is older than this is not eligible for
    /// new claims.
    pub staleness_threshold_secs: u64,
    /// Period at which agents send heartbeats.
    pub heartbeat_interval_secs: u64,
}

impl ClientRegistryConfig {
    /// Returns the token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        seconds(self.token_ttl_secs)
    }

    /// Returns the staleness threshold.
    #[must_use]
    pub fn staleness_threshold(&self) -> chrono::Duration {
        seconds(self.staleness_threshold_secs)
    }

    /// Returns the heartbeat period.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Default for ClientRegistryConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 30 * 24 * 60 * 60,
            staleness_threshold_secs: 90,
            heartbeat_interval_secs: 30,
        }
    }
}

/// Human-behaviour timing settings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Lower bound of the pause between workflow steps.
    pub step_pause_min_ms: u64,
    /// Upper bound of the pause between workflow steps.
    pub step_pause_max_ms: u64,
    /// Lower bound of the pause between scroll increments.
    pub scroll_pause_min_ms: u64,
    /// Upper bound of the pause between scroll increments.
    pub scroll_pause_max_ms: u64,
    /// Default timeout when waiting for an element.
    pub element_timeout_ms: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            step_pause_min_ms: 800,
            step_pause_max_ms: 2_500,
            scroll_pause_min_ms: 30,
            scroll_pause_max_ms: 120,
            element_timeout_ms: 15_000,
        }
    }
}

/// Agent worker loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Period of the claim loop.
    pub claim_interval_secs: u64,
}

impl WorkerConfig {
    /// Returns the claim loop period.
    #[must_use]
    pub const fn claim_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.claim_interval_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            claim_interval_secs: 5,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
        }
    }
}
