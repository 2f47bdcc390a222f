//! # Steem Client Telemetry
//!
//! One call installs the process-wide `tracing` subscriber that every
//! subsystem logs through.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SC_SERVICE_NAME` | `steem-client` | Service name in log lines |
//! | `SC_LOG_LEVEL` | `info` | Filter directive (`RUST_LOG` also honoured) |
//! | `SC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SC_JSON_LOGS` | `false` | JSON lines output |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global subscriber described by `config`.
///
/// Fails if the filter does not parse or a subscriber was already set.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_subscriber(config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        log_level = %config.log_level,
        "Telemetry initialized"
    );
    Ok(())
}
