//! Process shutdown signals.

use division_types::DivisionError;
use tracing::info;

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    /// Status a shell reports for a process killed by this signal
    /// (128 + signal number).
    #[must_use]
    pub fn exit_status(self) -> u8 {
        match self {
            Self::Interrupt => 130,
            Self::Terminate => 143,
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or, on unix, SIGTERM.
pub async fn shutdown_signal() -> Result<ShutdownSignal, DivisionError> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .map_err(DivisionError::Signal)?;

    #[cfg(unix)]
    let terminated = async {
        terminate.recv().await;
    };

    #[cfg(not(unix))]
    let terminated = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(DivisionError::Signal)?;
            info!("[Divisions] Received Ctrl+C, initiating graceful shutdown");
            Ok(ShutdownSignal::Interrupt)
        }
        () = terminated => {
            info!("[Divisions] Received terminate signal, initiating graceful shutdown");
            Ok(ShutdownSignal::Terminate)
        }
    }
}
