//! The division engine.
//!
//! ```text
//! discover ─→ validate meta ─→ sort ─→ resolve env ─→ setup ─→ start ─→ cleanup
//! └──────────────── Divisions::create ──────────────┘  └── Divisions::start ──┘
//! ```
//!
//! Everything up to and including environment resolution happens once, when
//! the engine is created, and fails before any hook runs. Each call to
//! [`Divisions::start`] is a fresh run: every hook is invoked again.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;

use division_types::DivisionError;
use tracing::{error, info, info_span, Instrument, Span};
use uuid::Uuid;

use crate::commands::{assemble_commands, AssembledGroup, DivisionCli};
use crate::discovery::{discover, DivisionLoader};
use crate::environment::{resolve_configuration, DotenvEnvironment, EnvironmentSource};
use crate::lifecycle::{setup_all, CleanupHandle, LifecycleLedger, SetupRun};
use crate::options::{DivisionsOptions, DEFAULT_DIVISIONS_DIR};
use crate::registry::{DivisionRegistry, LoadedDivision};
use crate::signals::{shutdown_signal, ShutdownSignal};
use crate::validation::{JsonSchemaValidator, SchemaValidator};

/// A validated, dependency-ordered, configured set of divisions.
#[derive(Debug)]
pub struct Divisions {
    registry: DivisionRegistry,
    options: DivisionsOptions,
}

impl Divisions {
    /// Discover divisions under the configured root, validate them against
    /// the process environment (plus env file) and order them.
    pub async fn create(
        options: DivisionsOptions,
        loader: &dyn DivisionLoader,
    ) -> Result<Self, DivisionError> {
        let env = DotenvEnvironment::new(options.env_path.clone());
        Self::create_with(options, loader, &env, &JsonSchemaValidator).await
    }

    /// [`Divisions::create`] with explicit environment and validator.
    pub async fn create_with(
        options: DivisionsOptions,
        loader: &dyn DivisionLoader,
        env: &dyn EnvironmentSource,
        validator: &dyn SchemaValidator,
    ) -> Result<Self, DivisionError> {
        let root = options
            .resolve_divisions_path()
            .map_err(|source| DivisionError::Discovery {
                path: PathBuf::from(DEFAULT_DIVISIONS_DIR),
                source,
            })?;

        info!("[Divisions] Discovering divisions in {}", root.display());
        let loaded = discover(&root, loader).await?;

        Self::from_modules(options, loaded, env, validator)
    }

    /// Build the engine from already loaded divisions.
    ///
    /// # Errors
    ///
    /// Pre-flight errors only: invalid metadata, a dependency cycle, or an
    /// environment that does not satisfy the declared schemas.
    pub fn from_modules(
        options: DivisionsOptions,
        loaded: Vec<LoadedDivision>,
        env: &dyn EnvironmentSource,
        validator: &dyn SchemaValidator,
    ) -> Result<Self, DivisionError> {
        let mut registry = DivisionRegistry::from_loaded(loaded, validator)?;
        registry.sort_by_dependencies()?;

        let configs = resolve_configuration(&registry.declared_schemas(), env, validator)?;
        registry.apply_configuration(configs);

        info!("[Divisions] {} divisions ready", registry.len());
        Ok(Self { registry, options })
    }

    #[must_use]
    pub fn registry(&self) -> &DivisionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> &DivisionsOptions {
        &self.options
    }

    /// Run the setup phase only.
    pub async fn setup_all(&self) -> Result<SetupRun<'_>, DivisionError> {
        setup_all(&self.registry, self.options.cleanup_order).await
    }

    /// Run setup then start; returns the handle that tears the run down.
    pub async fn start(&self) -> Result<CleanupHandle, DivisionError> {
        async {
            let run = self.setup_all().await?;
            run.start_all().await
        }
        .instrument(run_span())
        .await
    }

    /// Run setup, then collect every division's command group.
    pub async fn commands_by_division(&self) -> Result<Vec<AssembledGroup>, DivisionError> {
        async {
            let run = self.setup_all().await?;
            assemble_commands(&run).await
        }
        .instrument(run_span())
        .await
    }
}

fn run_span() -> Span {
    info_span!("divisions_run", run_id = %Uuid::new_v4())
}

/// Started divisions, waiting to be torn down.
#[derive(Debug)]
pub struct RunningDivisions {
    divisions: Divisions,
    cleanup: CleanupHandle,
}

impl RunningDivisions {
    #[must_use]
    pub fn divisions(&self) -> &Divisions {
        &self.divisions
    }

    /// Divisions that registered a cleanup callback, in teardown order.
    #[must_use]
    pub fn pending_cleanups(&self) -> Vec<&str> {
        self.cleanup.divisions()
    }

    /// Wait for SIGINT or SIGTERM, then run cleanup once.
    ///
    /// The signal is consumed: the caller exits normally after cleanup
    /// instead of being terminated by the signal.
    pub async fn wait_for_shutdown(self) -> Result<ShutdownSignal, DivisionError> {
        self.shutdown_on(shutdown_signal()).await
    }

    /// Run cleanup once `signal` resolves.
    ///
    /// # Errors
    ///
    /// A failing `signal` is returned as is and cleanup does not run.
    pub async fn shutdown_on<F>(self, signal: F) -> Result<ShutdownSignal, DivisionError>
    where
        F: Future<Output = Result<ShutdownSignal, DivisionError>>,
    {
        let signal = signal.await.map_err(|err| {
            error!("[Divisions] Could not listen for shutdown signals: {err}");
            err
        })?;
        self.cleanup.run().await?;
        Ok(signal)
    }

    /// Run cleanup now.
    pub async fn cleanup(self) -> Result<LifecycleLedger, DivisionError> {
        self.cleanup.run().await
    }
}

/// Create the engine and start every division.
pub async fn start_divisions(
    options: DivisionsOptions,
    loader: &dyn DivisionLoader,
) -> Result<RunningDivisions, DivisionError> {
    let divisions = Divisions::create(options, loader).await?;
    let cleanup = divisions.start().await?;

    info!(
        "[Divisions] Started, {} divisions registered cleanup",
        cleanup.len()
    );
    Ok(RunningDivisions { divisions, cleanup })
}

/// Create the engine, assemble the `div` command tree and run the command
/// selected by `args` (including the binary name).
pub async fn run_division_cli<I, T>(
    options: DivisionsOptions,
    loader: &dyn DivisionLoader,
    args: I,
) -> Result<(), DivisionError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let divisions = Divisions::create(options, loader).await?;
    let groups = divisions.commands_by_division().await?;

    DivisionCli::new(groups).run(args).await
}
