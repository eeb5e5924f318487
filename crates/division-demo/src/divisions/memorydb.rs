//! `memorydb`: an in-memory user store.
//!
//! Contributes its store under [`STORE_KEY`]. The store is a synchronized
//! handle, so dependents observe every later change.

use std::sync::Arc;

use division_runtime::{
    CommandGroup, CommandSpec, CommandsParam, DivisionModule, SetupOutcome, SetupParam,
    SharedState, StartOutcome, StartParam,
};
use parking_lot::RwLock;
use tracing::info;

/// Key the store is shared under.
pub const STORE_KEY: &str = "db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// Shared, mutable user table.
#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryDb {
    #[must_use]
    pub fn seeded() -> Self {
        let db = Self::default();
        db.insert("John");
        db.insert("Jane");
        db
    }

    /// Insert a user and return its id.
    pub fn insert(&self, name: impl Into<String>) -> u64 {
        let mut users = self.users.write();
        let id = users.last().map_or(1, |user| user.id + 1);
        users.push(User {
            id,
            name: name.into(),
        });
        id
    }

    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.users.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    pub fn clear(&self) {
        self.users.write().clear();
    }
}

pub fn division() -> DivisionModule {
    DivisionModule::new()
        .with_setup(setup)
        .with_commands(commands)
}

async fn setup(param: SetupParam) -> anyhow::Result<SetupOutcome> {
    let db = MemoryDb::seeded();
    info!(division = %param.name, users = db.len(), "Seeded user table");

    let start_db = db.clone();
    Ok(SetupOutcome::new()
        .with_shared(SharedState::new().with(STORE_KEY, db))
        .with_start(move |start: StartParam| start_division(start, start_db)))
}

async fn start_division(_start: StartParam, db: MemoryDb) -> anyhow::Result<StartOutcome> {
    info!(users = db.len(), "Memory database online");

    Ok(StartOutcome::new().with_cleanup(move || async move {
        db.clear();
        info!("Memory database closed");
        Ok(())
    }))
}

async fn commands(param: CommandsParam) -> anyhow::Result<CommandGroup> {
    let db = param
        .shared_from_setup
        .and_then(|shared| shared.get::<MemoryDb>(STORE_KEY))
        .ok_or_else(|| anyhow::anyhow!("memorydb setup did not share its store"))?;

    let list_db = Arc::clone(&db);
    let add_db = db;

    Ok(CommandGroup::new()
        .describe("Inspect the in-memory user table")
        .command(
            CommandSpec::new("list", move |_args: Vec<String>| {
                let db = Arc::clone(&list_db);
                async move {
                    for user in db.users() {
                        println!("{}\t{}", user.id, user.name);
                    }
                    Ok(())
                }
            })
            .describe("List users"),
        )
        .command(
            CommandSpec::new("add", move |args: Vec<String>| {
                let db = Arc::clone(&add_db);
                async move {
                    anyhow::ensure!(!args.is_empty(), "usage: add <name>...");
                    for name in args {
                        let id = db.insert(name.as_str());
                        println!("{id}\t{name}");
                    }
                    Ok(())
                }
            })
            .describe("Add users by name"),
        ))
}
