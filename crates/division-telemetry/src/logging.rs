//! Structured logging.
//!
//! Every lifecycle log line carries a `division` field so a run can be
//! filtered per division:
//! - `timestamp`: ISO 8601 timestamp
//! - `level`: Log level (trace, debug, info, warn, error)
//! - `division`: Division name
//! - `message`: Log message
//! - `run_id`: Orchestration run the line belongs to (from the enclosing span)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    if !config.console_output {
        return tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()));
    }

    if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
    }
}

/// Helper to create structured log entries with a `division` field.
#[macro_export]
macro_rules! log_event {
    (info, $division:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            division = $division,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $division:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            division = $division,
            $($($field)*,)?
            $msg
        )
    };

    (error, $division:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            division = $division,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $division:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            division = $division,
            $($($field)*,)?
            $msg
        )
    };
}
