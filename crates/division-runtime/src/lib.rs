//! # Division Runtime
//!
//! Orchestrates independently authored divisions.
//!
//! ## Flow
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌─────────────┐
//! │ discovery │──→│ registry │──→│ resolver │──→│ environment │
//! └───────────┘   └──────────┘   └──────────┘   └──────┬──────┘
//!                                                      ▼
//!                 ┌──────────┐   ┌──────────┐   ┌─────────────┐
//!                 │ commands │◄──│  setup   │──→│    start    │──→ cleanup
//!                 └──────────┘   └──────────┘   └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use division_runtime::{start_divisions, DivisionCatalog, DivisionsOptions};
//!
//! let catalog = DivisionCatalog::new()
//!     .register("memorydb", memorydb::division)
//!     .register("hello", hello::division);
//!
//! let running = start_divisions(DivisionsOptions::from_env(), &catalog).await?;
//! running.wait_for_shutdown().await?;
//! ```

pub mod commands;
pub mod discovery;
pub mod engine;
pub mod environment;
pub mod lifecycle;
pub mod options;
pub mod registry;
pub mod resolver;
pub mod signals;
pub mod validation;

pub use commands::{assemble_commands, AssembledGroup, DivisionCli, CLI_ABOUT, CLI_NAME};
pub use discovery::{discover, DivisionCatalog, DivisionLoader, META_FILE};
pub use engine::{run_division_cli, start_divisions, Divisions, RunningDivisions};
pub use environment::{
    aggregate, resolve_configuration, DeclaredSchema, DotenvEnvironment, EnvironmentSource,
};
pub use lifecycle::{
    setup_all, shared_view, CleanupHandle, CleanupOrder, LifecycleLedger, LifecycleState,
    SetupRun,
};
pub use options::{project_directory, DivisionsOptions};
pub use registry::{DivisionRecord, DivisionRegistry, LoadedDivision};
pub use resolver::{resolve_order, DependencyNode};
pub use signals::{shutdown_signal, ShutdownSignal};
pub use validation::{JsonSchemaValidator, SchemaValidator};

pub use division_types::*;
