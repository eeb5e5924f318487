//! Filesystem discovery of division directories.
//!
//! Every subdirectory of the divisions root is a candidate division named
//! after the directory. A [`DivisionLoader`] turns the candidate into a
//! [`DivisionModule`]; a loader that has nothing for a directory excludes
//! it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use division_types::{DivisionError, DivisionModule};
use serde_json::Value;
use tracing::{debug, info};

use crate::registry::LoadedDivision;

/// Metadata file read when a module carries no metadata of its own.
pub const META_FILE: &str = "meta.json";

/// Produces the module for a discovered division directory.
#[async_trait]
pub trait DivisionLoader: Send + Sync {
    /// Load the division in `root_path`. `Ok(None)` excludes the directory.
    async fn load(&self, name: &str, root_path: &Path)
        -> Result<Option<DivisionModule>, DivisionError>;
}

type ModuleFactory = Arc<dyn Fn() -> DivisionModule + Send + Sync>;

/// Compiled-in divisions keyed by directory name.
///
/// A registered module without metadata picks up `meta.json` from its
/// directory when the file exists.
#[derive(Clone, Default)]
pub struct DivisionCatalog {
    factories: BTreeMap<String, ModuleFactory>,
}

impl DivisionCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> DivisionModule + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl std::fmt::Debug for DivisionCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DivisionCatalog")
            .field("divisions", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl DivisionLoader for DivisionCatalog {
    async fn load(
        &self,
        name: &str,
        root_path: &Path,
    ) -> Result<Option<DivisionModule>, DivisionError> {
        let Some(factory) = self.factories.get(name) else {
            debug!(division = name, "[Discovery] No module registered, skipping");
            return Ok(None);
        };

        let mut module = factory();
        if module.metadata.is_none() {
            module.metadata = read_meta_file(name, root_path).await?;
        }
        Ok(Some(module))
    }
}

async fn read_meta_file(name: &str, root_path: &Path) -> Result<Option<Value>, DivisionError> {
    let path = root_path.join(META_FILE);

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(DivisionError::Discovery { path, source }),
    };

    debug!(division = name, "[Discovery] Read {}", path.display());
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| DivisionError::Discovery {
            path,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
}

/// Discover every division under `root`, sorted by directory name.
///
/// # Errors
///
/// [`DivisionError::Discovery`] when `root` cannot be listed, plus any
/// loader error.
pub async fn discover(
    root: &Path,
    loader: &dyn DivisionLoader,
) -> Result<Vec<LoadedDivision>, DivisionError> {
    let discovery_error = |source| DivisionError::Discovery {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(discovery_error)?;
    let mut directories: Vec<(String, PathBuf)> = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
        let file_type = entry.file_type().await.map_err(discovery_error)?;
        if !file_type.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        directories.push((name, entry.path()));
    }
    directories.sort_by(|a, b| a.0.cmp(&b.0));

    let mut loaded = Vec::with_capacity(directories.len());
    for (name, root_path) in directories {
        if let Some(module) = loader.load(&name, &root_path).await? {
            loaded.push(LoadedDivision::new(name, root_path, module));
        }
    }

    info!(
        "[Discovery] Found {} divisions in {}",
        loaded.len(),
        root.display()
    );
    Ok(loaded)
}
