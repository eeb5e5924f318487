//! Command groups exposed by divisions.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::hooks::HookFuture;

/// Handler for a leaf command. Receives the raw trailing arguments.
pub type CommandHandler = Arc<dyn Fn(Vec<String>) -> HookFuture<()> + Send + Sync>;

/// A single runnable command.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub description: Option<String>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            handler: Arc::new(move |args| -> HookFuture<()> { Box::pin(handler(args)) }),
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The command surface of one division.
///
/// `name` and `description` may be left empty; the runtime fills them from
/// the division name.
#[derive(Debug, Clone, Default)]
pub struct CommandGroup {
    pub name: Option<String>,
    pub description: Option<String>,
    pub commands: Vec<CommandSpec>,
}

impl CommandGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }
}
