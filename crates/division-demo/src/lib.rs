//! Example divisions.
//!
//! The division directories (with their `meta.json`) live next to this
//! crate's manifest, in `divisions/`.

pub mod divisions;

use std::path::PathBuf;

use division_runtime::DivisionCatalog;

pub use divisions::hello::{Greeter, GREETER_KEY};
pub use divisions::memorydb::{MemoryDb, User, STORE_KEY};

/// The bundled divisions directory.
#[must_use]
pub fn divisions_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("divisions")
}

/// Every example division, keyed by directory name.
#[must_use]
pub fn catalog() -> DivisionCatalog {
    DivisionCatalog::new()
        .register("memorydb", divisions::memorydb::division)
        .register("hello", divisions::hello::division)
}
