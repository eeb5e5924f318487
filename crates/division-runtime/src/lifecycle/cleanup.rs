//! Teardown of a started run.

use std::fmt;
use std::str::FromStr;

use division_telemetry::log_event;
use division_types::{CleanupFn, DivisionError};
use tracing::info;

use super::{LifecycleLedger, LifecycleState};

/// Order in which cleanup callbacks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanupOrder {
    /// Collection order: dependencies are cleaned up before dependents.
    #[default]
    Forward,
    /// Dependents are cleaned up before their dependencies.
    Reverse,
}

impl FromStr for CleanupOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "reverse" => Ok(Self::Reverse),
            other => Err(format!("unknown cleanup order '{other}', expected forward or reverse")),
        }
    }
}

impl fmt::Display for CleanupOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

/// The single teardown entry point of a started run.
///
/// Consumed by [`CleanupHandle::run`], so callbacks can run at most once.
pub struct CleanupHandle {
    callbacks: Vec<(String, CleanupFn)>,
    order: CleanupOrder,
    ledger: LifecycleLedger,
}

impl CleanupHandle {
    pub(crate) fn new(
        callbacks: Vec<(String, CleanupFn)>,
        order: CleanupOrder,
        ledger: LifecycleLedger,
    ) -> Self {
        Self {
            callbacks,
            order,
            ledger,
        }
    }

    /// Number of collected callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Divisions with a callback, in the order they will be cleaned up.
    #[must_use]
    pub fn divisions(&self) -> Vec<&str> {
        let names = self.callbacks.iter().map(|(name, _)| name.as_str());
        match self.order {
            CleanupOrder::Forward => names.collect(),
            CleanupOrder::Reverse => names.rev().collect(),
        }
    }

    #[must_use]
    pub fn order(&self) -> CleanupOrder {
        self.order
    }

    /// States reached by the run so far.
    #[must_use]
    pub fn ledger(&self) -> &LifecycleLedger {
        &self.ledger
    }

    /// Await every callback in turn.
    ///
    /// # Errors
    ///
    /// The first failing callback stops the teardown; the remaining
    /// callbacks never run.
    pub async fn run(self) -> Result<LifecycleLedger, DivisionError> {
        let Self {
            mut callbacks,
            order,
            mut ledger,
        } = self;

        if order == CleanupOrder::Reverse {
            callbacks.reverse();
        }

        info!("[Divisions] Cleaning up {} divisions ({order})", callbacks.len());

        for (division, cleanup) in callbacks {
            log_event!(debug, division.as_str(), "[Divisions] Running cleanup");

            if let Err(source) = cleanup().await {
                log_event!(error, division.as_str(), "[Divisions] Cleanup failed", error = %source);
                return Err(DivisionError::Cleanup { division, source });
            }

            ledger.advance(&division, LifecycleState::CleanedUp);
        }

        info!("[Divisions] Cleanup complete");
        Ok(ledger)
    }
}

impl fmt::Debug for CleanupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupHandle")
            .field("divisions", &self.divisions())
            .field("order", &self.order)
            .finish()
    }
}
