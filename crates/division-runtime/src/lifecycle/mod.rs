//! # Lifecycle Orchestrator
//!
//! Drives every division through setup and start in registry order.
//!
//! ```text
//! Discovered → ConfigResolved → SetupComplete → StartComplete → CleanedUp
//! ```
//!
//! ## Phases
//!
//! 1. **Setup**: each division with a setup hook is called with its name,
//!    configuration, root path and the state its direct dependencies have
//!    contributed so far. Returned state is recorded, as is the returned
//!    start hook.
//! 2. **Start**: each collected start hook is called with a freshly built
//!    view. Returned state is merged into the division's contribution and
//!    returned cleanup callbacks are collected.
//! 3. **Cleanup**: the [`CleanupHandle`] returned by start runs the
//!    collected callbacks exactly once.
//!
//! Hooks run one at a time. A failing hook stops the run; nothing that
//! already ran is rolled back.

mod cleanup;

pub use cleanup::{CleanupHandle, CleanupOrder};

use std::collections::{BTreeMap, HashMap};

use division_telemetry::{division_span, log_event};
use division_types::{
    CleanupFn, DivisionError, HookPhase, SetupParam, SharedState, SharedView, StartHook,
    StartParam,
};
use tracing::{info, warn, Instrument};

use crate::registry::{DivisionRecord, DivisionRegistry};

/// Per-division lifecycle state within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    Discovered,
    ConfigResolved,
    SetupComplete,
    StartComplete,
    CleanedUp,
}

/// States reached by each division during one run. States only move
/// forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleLedger {
    states: BTreeMap<String, LifecycleState>,
}

impl LifecycleLedger {
    /// Move `division` to `state`. Returns false (and changes nothing) if the
    /// division already reached `state` or a later one.
    pub fn advance(&mut self, division: &str, state: LifecycleState) -> bool {
        match self.states.get(division) {
            Some(current) if *current >= state => false,
            _ => {
                self.states.insert(division.to_string(), state);
                true
            }
        }
    }

    #[must_use]
    pub fn state_of(&self, division: &str) -> Option<LifecycleState> {
        self.states.get(division).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, LifecycleState)> {
        self.states.iter().map(|(name, state)| (name.as_str(), *state))
    }
}

/// Build the view `record` may see: the contributions of its direct
/// dependencies, copied. Dependencies that contributed nothing are absent.
#[must_use]
pub fn shared_view(record: &DivisionRecord, contributed: &HashMap<String, SharedState>) -> SharedView {
    let mut view = SharedView::new();
    for dependency in record.depends_on() {
        if let Some(state) = contributed.get(dependency) {
            view.insert(dependency.clone(), state.clone());
        }
    }
    view
}

/// The outcome of the setup phase, and the continuation into start.
pub struct SetupRun<'r> {
    registry: &'r DivisionRegistry,
    contributed: HashMap<String, SharedState>,
    setup_params: HashMap<String, SetupParam>,
    start_hooks: Vec<(String, StartHook)>,
    ledger: LifecycleLedger,
    cleanup_order: CleanupOrder,
}

impl<'r> SetupRun<'r> {
    fn new(registry: &'r DivisionRegistry, cleanup_order: CleanupOrder) -> Self {
        let mut ledger = LifecycleLedger::default();
        for record in registry.iter() {
            ledger.advance(&record.name, LifecycleState::Discovered);
            ledger.advance(&record.name, LifecycleState::ConfigResolved);
        }

        Self {
            registry,
            contributed: HashMap::new(),
            setup_params: HashMap::new(),
            start_hooks: Vec::new(),
            ledger,
            cleanup_order,
        }
    }

    /// The param `record`'s setup hook was (or would have been) called
    /// with, given the state contributed so far.
    #[must_use]
    pub fn param_for(&self, record: &DivisionRecord) -> SetupParam {
        SetupParam {
            name: record.name.clone(),
            config: record.config.clone(),
            shared: shared_view(record, &self.contributed),
            root_path: record.root_path.clone(),
        }
    }

    /// The param recorded when `division`'s setup hook ran.
    #[must_use]
    pub fn setup_param(&self, division: &str) -> Option<&SetupParam> {
        self.setup_params.get(division)
    }

    /// State `division` contributed during setup.
    #[must_use]
    pub fn shared_of(&self, division: &str) -> Option<&SharedState> {
        self.contributed.get(division)
    }

    #[must_use]
    pub fn state_of(&self, division: &str) -> Option<LifecycleState> {
        self.ledger.state_of(division)
    }

    #[must_use]
    pub fn ledger(&self) -> &LifecycleLedger {
        &self.ledger
    }

    #[must_use]
    pub fn registry(&self) -> &'r DivisionRegistry {
        self.registry
    }

    /// Divisions whose setup returned a start hook, in start order.
    #[must_use]
    pub fn pending_starts(&self) -> Vec<&str> {
        self.start_hooks.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run every collected start hook.
    ///
    /// # Errors
    ///
    /// - [`DivisionError::Hook`] with phase `start` if a start hook fails
    /// - [`DivisionError::InvalidCleanup`] if a start hook hands back a
    ///   cleanup value that cannot be invoked
    /// - [`DivisionError::MissingReference`] if a start hook belongs to a
    ///   division the registry no longer holds
    pub async fn start_all(self) -> Result<CleanupHandle, DivisionError> {
        let Self {
            registry,
            mut contributed,
            start_hooks,
            mut ledger,
            cleanup_order,
            ..
        } = self;

        let mut callbacks: Vec<(String, CleanupFn)> = Vec::new();

        for (name, start) in start_hooks {
            let record = registry.require(&name)?;
            let shared = shared_view(record, &contributed);

            log_event!(info, name.as_str(), "[Divisions] Starting", visible = shared.len());

            let outcome = start(StartParam { shared })
                .instrument(division_span!("division_start", division = name.as_str()))
                .await
                .map_err(|source| {
                    log_event!(error, name.as_str(), "[Divisions] Start failed", error = %source);
                    DivisionError::Hook {
                        division: name.clone(),
                        phase: HookPhase::Start,
                        source,
                    }
                })?;

            if let Some(cleanup) = outcome.cleanup {
                let Some(callback) = cleanup.into_callback() else {
                    log_event!(error, name.as_str(), "[Divisions] Start returned a cleanup that is not a function");
                    return Err(DivisionError::InvalidCleanup { division: name });
                };
                callbacks.push((name.clone(), callback));
            }

            if let Some(shared) = outcome.shared {
                contributed.entry(name.clone()).or_default().merge(shared);
            }

            ledger.advance(&name, LifecycleState::StartComplete);
        }

        info!(
            "[Divisions] Start complete, {} cleanup callbacks collected",
            callbacks.len()
        );
        Ok(CleanupHandle::new(callbacks, cleanup_order, ledger))
    }
}

impl std::fmt::Debug for SetupRun<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupRun")
            .field("contributed", &self.contributed)
            .field("pending_starts", &self.pending_starts())
            .field("ledger", &self.ledger)
            .finish()
    }
}

/// Run every setup hook in registry order.
///
/// # Errors
///
/// [`DivisionError::Hook`] with phase `setup` for the first failing hook.
/// Later divisions are never set up and no start hook runs.
pub async fn setup_all(
    registry: &DivisionRegistry,
    cleanup_order: CleanupOrder,
) -> Result<SetupRun<'_>, DivisionError> {
    if !registry.is_sorted() {
        warn!("[Divisions] Registry is not in dependency order");
    }

    let mut run = SetupRun::new(registry, cleanup_order);

    for record in registry.iter() {
        let Some(setup) = record.setup.as_ref() else {
            continue;
        };
        let name = record.name.as_str();

        let param = run.param_for(record);
        run.setup_params.insert(record.name.clone(), param.clone());

        log_event!(info, name, "[Divisions] Running setup", visible = param.shared.len());

        let outcome = setup(param)
            .instrument(division_span!("division_setup", division = name))
            .await
            .map_err(|source| {
                log_event!(error, name, "[Divisions] Setup failed", error = %source);
                DivisionError::Hook {
                    division: record.name.clone(),
                    phase: HookPhase::Setup,
                    source,
                }
            })?;

        if let Some(shared) = outcome.shared {
            run.contributed.insert(record.name.clone(), shared);
        }
        if let Some(start) = outcome.start {
            run.start_hooks.push((record.name.clone(), start));
        }
        run.ledger.advance(name, LifecycleState::SetupComplete);
    }

    info!(
        "[Divisions] Setup complete, {} divisions to start",
        run.start_hooks.len()
    );
    Ok(run)
}
