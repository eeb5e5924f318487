//! Engine options.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DIVISIONS_PATH` | `<project dir>/divisions` | Directory holding one subdirectory per division |
//! | `DIVISIONS_ENV_PATH` | `.env` lookup | Env file merged under the process environment |
//! | `DIVISIONS_CLEANUP_ORDER` | `forward` | `forward` or `reverse` |

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::lifecycle::CleanupOrder;

/// Directory name looked up under the project directory.
pub const DEFAULT_DIVISIONS_DIR: &str = "divisions";

/// Options for [`crate::Divisions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DivisionsOptions {
    /// Divisions root; defaults to `<project dir>/divisions`.
    pub divisions_path: Option<PathBuf>,
    /// Env file; defaults to a `.env` file found from the working directory.
    pub env_path: Option<PathBuf>,
    pub cleanup_order: CleanupOrder,
}

impl DivisionsOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from environment variables.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Some(path) = non_empty_var("DIVISIONS_PATH") {
            options.divisions_path = Some(PathBuf::from(path));
        }

        if let Some(path) = non_empty_var("DIVISIONS_ENV_PATH") {
            options.env_path = Some(PathBuf::from(path));
        }

        if let Some(order) = non_empty_var("DIVISIONS_CLEANUP_ORDER") {
            match order.parse() {
                Ok(order) => options.cleanup_order = order,
                Err(e) => warn!("[Divisions] Ignoring DIVISIONS_CLEANUP_ORDER: {e}"),
            }
        }

        options
    }

    #[must_use]
    pub fn with_divisions_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.divisions_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_env_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_cleanup_order(mut self, order: CleanupOrder) -> Self {
        self.cleanup_order = order;
        self
    }

    /// The divisions root to scan.
    ///
    /// Falls back to `<project dir>/divisions`, or `./divisions` when no
    /// project directory is found.
    pub fn resolve_divisions_path(&self) -> std::io::Result<PathBuf> {
        if let Some(path) = &self.divisions_path {
            return Ok(path.clone());
        }

        let cwd = std::env::current_dir()?;
        let project = project_directory(&cwd).unwrap_or(cwd);
        Ok(project.join(DEFAULT_DIVISIONS_DIR))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Nearest ancestor of `start` (inclusive) containing a `Cargo.toml`.
#[must_use]
pub fn project_directory(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file())
        .map(Path::to_path_buf)
}
