//! Error taxonomy for division orchestration.
//!
//! Errors fall into two families:
//!
//! - **Pre-flight**: raised while discovering, validating or ordering
//!   divisions. No hook has run yet, so failing fast has no side effects.
//! - **Lifecycle**: raised by a hook or cleanup callback. Hooks that already
//!   completed keep their side effects; nothing is rolled back.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The lifecycle phase a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// The division's `setup` hook.
    Setup,
    /// The `start` hook returned by setup.
    Start,
    /// The hook producing the division's command group.
    Commands,
    /// A leaf command handler invoked from the CLI.
    Command,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Start => write!(f, "start"),
            Self::Commands => write!(f, "commands"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// One violated schema constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer into the validated document (empty for the root).
    pub instance_path: String,
    /// Human-readable description of the violated constraint.
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Coarse error classification callers can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid metadata, invalid environment, or a non-invocable cleanup.
    Configuration,
    /// The dependency graph contains a cycle.
    Cycle,
    /// An internal lookup found no registered division.
    MissingReference,
    /// A setup, start, commands or command hook failed.
    Hook,
    /// A cleanup callback failed.
    Cleanup,
    /// Discovery, environment loading, signals or argument parsing failed.
    Boundary,
}

/// Errors raised by the division engine.
#[derive(Debug, Error)]
pub enum DivisionError {
    #[error("Division {division}: Invalid meta ({})", join_violations(.violations))]
    InvalidMetadata {
        division: String,
        violations: Vec<SchemaViolation>,
    },

    #[error("Invalid env ({})", join_violations(.violations))]
    InvalidEnvironment { violations: Vec<SchemaViolation> },

    #[error("Division {division}: \"cleanup\" must be a function")]
    InvalidCleanup { division: String },

    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Division {division} not found")]
    MissingReference { division: String },

    /// A commands hook belongs to a division whose setup never ran.
    #[error("Division {division} has no setup param")]
    MissingSetupParam { division: String },

    #[error("Division {division}: {phase} hook failed: {source}")]
    Hook {
        division: String,
        phase: HookPhase,
        #[source]
        source: anyhow::Error,
    },

    #[error("Division {division}: cleanup failed: {source}")]
    Cleanup {
        division: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to discover divisions in {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load environment: {0}")]
    EnvironmentSource(String),

    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[source] std::io::Error),

    #[error("CLI error: {0}")]
    Cli(String),
}

impl DivisionError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMetadata { .. }
            | Self::InvalidEnvironment { .. }
            | Self::InvalidCleanup { .. } => ErrorKind::Configuration,
            Self::Cycle { .. } => ErrorKind::Cycle,
            Self::MissingReference { .. } | Self::MissingSetupParam { .. } => {
                ErrorKind::MissingReference
            }
            Self::Hook { .. } => ErrorKind::Hook,
            Self::Cleanup { .. } => ErrorKind::Cleanup,
            Self::Discovery { .. }
            | Self::EnvironmentSource(_)
            | Self::Signal(_)
            | Self::Cli(_) => ErrorKind::Boundary,
        }
    }

    /// True when the error was raised before any lifecycle hook ran.
    ///
    /// An invalid cleanup value is only detected after its start hook
    /// returned, so it is not pre-flight even though it is a configuration
    /// error.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::InvalidMetadata { .. }
                | Self::InvalidEnvironment { .. }
                | Self::Cycle { .. }
                | Self::Discovery { .. }
                | Self::EnvironmentSource(_)
        )
    }

    /// The division this error is attributed to, if any.
    #[must_use]
    pub fn division(&self) -> Option<&str> {
        match self {
            Self::InvalidMetadata { division, .. }
            | Self::InvalidCleanup { division }
            | Self::MissingReference { division }
            | Self::MissingSetupParam { division }
            | Self::Hook { division, .. }
            | Self::Cleanup { division, .. } => Some(division),
            _ => None,
        }
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
