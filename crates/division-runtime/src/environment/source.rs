//! Environment sources.
//!
//! The process environment wins over env-file values: a file only fills
//! keys the process does not already define.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use division_types::DivisionError;
use tracing::{debug, info};

/// Supplies raw environment key/value pairs.
pub trait EnvironmentSource: Send + Sync {
    fn load(&self) -> Result<HashMap<String, String>, DivisionError>;
}

/// Fixed key/value pairs, mostly useful for tests and embedding.
impl EnvironmentSource for HashMap<String, String> {
    fn load(&self) -> Result<HashMap<String, String>, DivisionError> {
        Ok(self.clone())
    }
}

/// Process environment merged with an optional env file.
#[derive(Debug, Clone, Default)]
pub struct DotenvEnvironment {
    env_path: Option<PathBuf>,
}

impl DotenvEnvironment {
    /// Read `env_path` if given, otherwise look for a `.env` file from the
    /// working directory upwards.
    pub fn new(env_path: Option<PathBuf>) -> Self {
        Self { env_path }
    }

    fn file_values(&self) -> Result<Vec<(String, String)>, DivisionError> {
        match &self.env_path {
            Some(path) => read_env_file(path),
            None => match dotenvy::dotenv_iter() {
                Ok(iter) => iter
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| DivisionError::EnvironmentSource(e.to_string())),
                Err(e) if e.not_found() => {
                    debug!("[Environment] No .env file found");
                    Ok(Vec::new())
                }
                Err(e) => Err(DivisionError::EnvironmentSource(e.to_string())),
            },
        }
    }
}

fn read_env_file(path: &Path) -> Result<Vec<(String, String)>, DivisionError> {
    info!("[Environment] Loading env file {}", path.display());

    dotenvy::from_path_iter(path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|e| DivisionError::EnvironmentSource(format!("{}: {e}", path.display())))
}

/// Process variables whose key and value are both valid UTF-8. Others are
/// skipped.
fn process_values() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                debug!("[Environment] Skipping non UTF-8 variable {key:?}");
                None
            }
        })
        .collect()
}

impl EnvironmentSource for DotenvEnvironment {
    fn load(&self) -> Result<HashMap<String, String>, DivisionError> {
        let mut values = process_values();

        for (key, value) in self.file_values()? {
            values.entry(key).or_insert(value);
        }

        Ok(values)
    }
}
