//! # Division Types Crate
//!
//! This crate contains the data model every division and the runtime agree
//! on.
//!
//! ## Design Principles
//!
//! - **Optional capabilities**: A division is a record of optional hooks
//!   (`setup`, `commands`) plus optional metadata. Presence is checked, never
//!   assumed.
//! - **Opaque state**: Contributed state is a bag of immutable shared
//!   handles. Dependents receive copies of the bag, never the store itself.
//! - **Frozen configuration**: Resolved environment values cannot be mutated
//!   once handed to a division.

pub mod commands;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod meta;
pub mod state;

pub use commands::{CommandGroup, CommandHandler, CommandSpec};
pub use config::DivisionConfig;
pub use errors::{DivisionError, ErrorKind, HookPhase, SchemaViolation};
pub use hooks::{
    CleanupFn, CleanupValue, CommandsHook, CommandsParam, DivisionModule, HookFuture,
    SetupHook, SetupOutcome, SetupParam, StartHook, StartOutcome, StartParam,
};
pub use meta::{meta_schema, DivisionMeta};
pub use state::{SharedState, SharedView, StateValue};
