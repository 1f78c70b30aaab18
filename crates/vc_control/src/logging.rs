//! Tracing subscriber setup.

use crate::config::LoggingSection;
use tracing_subscriber::EnvFilter;
use vc_control_error::ConfigError;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Errors
///
/// Fails when the configured filter does not parse or a subscriber is
/// already installed.
pub fn init_tracing(logging: &LoggingSection, force_json: bool) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(logging.filter())
            .map_err(|e| ConfigError::new(format!("Invalid log filter: {}", e)))?,
    };

    let installed = if force_json || *logging.json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    installed.map_err(|e| ConfigError::new(format!("Failed to install logger: {}", e)))
}
