//! Structured logging setup.

use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Error returned when the global subscriber cannot be installed.
#[derive(Debug, Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct TelemetryError(String);

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|err| TelemetryError(err.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|err| TelemetryError(err.to_string()))
}
