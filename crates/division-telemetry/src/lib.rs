//! # Division Telemetry
//!
//! Logging setup shared by the division runtime and binaries built on it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use division_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//!     // Lifecycle logs are now written to the console
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DIV_SERVICE_NAME` | `divisions` | Service name in the startup line |
//! | `DIV_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `DIV_CONSOLE_OUTPUT` | `true` | Write logs to the console |
//! | `DIV_JSON_LOGS` | `false` | JSON output (defaults on inside containers) |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging for the process.
///
/// Returns a guard that should be held for the lifetime of the
/// application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

/// Span wrapping one lifecycle hook of a division.
///
/// # Example
///
/// ```rust,ignore
/// use division_telemetry::division_span;
/// use tracing::Instrument;
///
/// setup(param)
///     .instrument(division_span!("division_setup", division = "memorydb"))
///     .await?;
/// ```
#[macro_export]
macro_rules! division_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
