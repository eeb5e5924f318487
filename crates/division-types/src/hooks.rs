//! # Division Hooks
//!
//! A division is a [`DivisionModule`]: a record of optional capabilities.
//!
//! ```text
//! DivisionModule
//! ├── metadata?   loose JSON: { envSchema?, dependsOn? }
//! ├── setup?      SetupParam  ──→ SetupOutcome { shared?, start? }
//! │                                            │
//! │                                            ▼
//! │                     StartParam ──→ StartOutcome { shared?, cleanup? }
//! └── commands?   CommandsParam ──→ CommandGroup
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let module = DivisionModule::new()
//!     .with_metadata(json!({ "dependsOn": ["memorydb"] }))
//!     .with_setup(|param: SetupParam| async move {
//!         Ok(SetupOutcome::new().with_start(|start: StartParam| async move {
//!             let users = start.shared.lookup::<Vec<User>>("memorydb", "users");
//!             Ok(StartOutcome::new())
//!         }))
//!     });
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::commands::CommandGroup;
use crate::config::DivisionConfig;
use crate::state::{SharedState, SharedView};

/// Future returned by every hook.
pub type HookFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

/// Setup hook. Callable once per orchestration run.
pub type SetupHook = Arc<dyn Fn(SetupParam) -> HookFuture<SetupOutcome> + Send + Sync>;

/// Start hook returned from setup. Consumed by the start phase.
pub type StartHook = Box<dyn FnOnce(StartParam) -> HookFuture<StartOutcome> + Send>;

/// Cleanup callback returned from start. Consumed by teardown.
pub type CleanupFn = Box<dyn FnOnce() -> HookFuture<()> + Send>;

/// Hook producing the division's command group.
pub type CommandsHook = Arc<dyn Fn(CommandsParam) -> HookFuture<CommandGroup> + Send + Sync>;

/// Input to a division's setup hook.
#[derive(Debug, Clone)]
pub struct SetupParam {
    /// Division name.
    pub name: String,
    /// Resolved configuration; `None` unless the division declared at least
    /// one environment property.
    pub config: Option<DivisionConfig>,
    /// State contributed by direct dependencies so far.
    pub shared: SharedView,
    /// The division's directory.
    pub root_path: PathBuf,
}

/// Input to a start hook.
#[derive(Debug, Clone)]
pub struct StartParam {
    /// State contributed by direct dependencies, including what their own
    /// start hooks added.
    pub shared: SharedView,
}

/// Input to a commands hook: the setup param plus the division's own setup
/// contribution.
#[derive(Debug, Clone)]
pub struct CommandsParam {
    pub setup: SetupParam,
    pub shared_from_setup: Option<SharedState>,
}

/// What a setup hook returns.
#[derive(Default)]
pub struct SetupOutcome {
    pub shared: Option<SharedState>,
    pub start: Option<StartHook>,
}

impl SetupOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shared(mut self, shared: SharedState) -> Self {
        self.shared = Some(shared);
        self
    }

    #[must_use]
    pub fn with_start<F, Fut>(mut self, start: F) -> Self
    where
        F: FnOnce(StartParam) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<StartOutcome>> + Send + 'static,
    {
        self.start = Some(Box::new(move |param| -> HookFuture<StartOutcome> {
            Box::pin(start(param))
        }));
        self
    }
}

impl fmt::Debug for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupOutcome")
            .field("shared", &self.shared)
            .field("start", &self.start.is_some())
            .finish()
    }
}

/// A cleanup value returned from a start hook.
///
/// Divisions driven by data rather than code (for example a bridge that
/// forwards a scripted module's exports) may hand back a value where a
/// callback was expected; the start phase rejects it.
pub enum CleanupValue {
    Callback(CleanupFn),
    Opaque(Value),
}

impl CleanupValue {
    pub fn callback<F, Fut>(cleanup: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Callback(Box::new(move || -> HookFuture<()> { Box::pin(cleanup()) }))
    }

    #[must_use]
    pub fn is_invocable(&self) -> bool {
        matches!(self, Self::Callback(_))
    }

    /// The callback, if this value is invocable.
    #[must_use]
    pub fn into_callback(self) -> Option<CleanupFn> {
        match self {
            Self::Callback(cleanup) => Some(cleanup),
            Self::Opaque(_) => None,
        }
    }
}

impl fmt::Debug for CleanupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Opaque(value) => f.debug_tuple("Opaque").field(value).finish(),
        }
    }
}

/// What a start hook returns.
#[derive(Debug, Default)]
pub struct StartOutcome {
    pub cleanup: Option<CleanupValue>,
    pub shared: Option<SharedState>,
}

impl StartOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shared(mut self, shared: SharedState) -> Self {
        self.shared = Some(shared);
        self
    }

    #[must_use]
    pub fn with_cleanup<F, Fut>(mut self, cleanup: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.cleanup = Some(CleanupValue::callback(cleanup));
        self
    }

    #[must_use]
    pub fn with_cleanup_value(mut self, cleanup: CleanupValue) -> Self {
        self.cleanup = Some(cleanup);
        self
    }
}

/// A loaded division: optional metadata plus optional hooks.
#[derive(Clone, Default)]
pub struct DivisionModule {
    pub metadata: Option<Value>,
    pub setup: Option<SetupHook>,
    pub commands: Option<CommandsHook>,
}

impl DivisionModule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_setup<F, Fut>(mut self, setup: F) -> Self
    where
        F: Fn(SetupParam) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<SetupOutcome>> + Send + 'static,
    {
        self.setup = Some(Arc::new(move |param| -> HookFuture<SetupOutcome> {
            Box::pin(setup(param))
        }));
        self
    }

    #[must_use]
    pub fn with_commands<F, Fut>(mut self, commands: F) -> Self
    where
        F: Fn(CommandsParam) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<CommandGroup>> + Send + 'static,
    {
        self.commands = Some(Arc::new(move |param| -> HookFuture<CommandGroup> {
            Box::pin(commands(param))
        }));
        self
    }

    #[must_use]
    pub fn has_setup(&self) -> bool {
        self.setup.is_some()
    }

    #[must_use]
    pub fn has_commands(&self) -> bool {
        self.commands.is_some()
    }
}

impl fmt::Debug for DivisionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DivisionModule")
            .field("metadata", &self.metadata)
            .field("setup", &self.setup.is_some())
            .field("commands", &self.commands.is_some())
            .finish()
    }
}
