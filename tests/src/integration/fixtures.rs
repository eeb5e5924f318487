//! Shared fixtures for the integration flows.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use division_runtime::{
    DivisionModule, SetupOutcome, SetupParam, SharedState, StartOutcome, StartParam,
};
use parking_lot::Mutex;
use serde_json::Value;

/// Ordered record of hook invocations.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::default()
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}

pub fn no_env() -> HashMap<String, String> {
    HashMap::new()
}

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Create `root/<name>`, writing `meta.json` when `meta` is given.
pub fn write_division(root: &Path, name: &str, meta: Option<Value>) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    if let Some(meta) = meta {
        std::fs::write(dir.join("meta.json"), meta.to_string()).unwrap();
    }
}

/// A division journaling `setup:<name>`, `start:<name>` and
/// `cleanup:<name>`. It contributes `{ "<name>": "<name>" }` from setup and
/// `{ "started": true }` from start, and journals the dependencies visible
/// to each hook as `setup:<name>[a,b]`.
pub fn traced(name: &'static str, journal: &Journal) -> DivisionModule {
    let journal = Arc::clone(journal);
    DivisionModule::new().with_setup(move |param: SetupParam| {
        let journal = Arc::clone(&journal);
        async move {
            let visible: Vec<&str> = param.shared.divisions().collect();
            journal
                .lock()
                .push(format!("setup:{name}[{}]", visible.join(",")));

            Ok(SetupOutcome::new()
                .with_shared(SharedState::new().with(name, name.to_string()))
                .with_start(move |start: StartParam| async move {
                    let visible: Vec<&str> = start.shared.divisions().collect();
                    journal
                        .lock()
                        .push(format!("start:{name}[{}]", visible.join(",")));

                    Ok(StartOutcome::new()
                        .with_shared(SharedState::new().with("started", true))
                        .with_cleanup(move || async move {
                            journal.lock().push(format!("cleanup:{name}"));
                            Ok(())
                        }))
                }))
        }
    })
}
