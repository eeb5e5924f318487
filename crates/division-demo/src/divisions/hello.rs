//! `hello`: greets the users stored by `memorydb`.
//!
//! Reads `GREETING` (default `Hello`) and `HELLO_VERBOSE` from its
//! configuration.

use std::sync::Arc;

use division_runtime::{
    CommandGroup, CommandSpec, CommandsParam, DivisionConfig, DivisionModule, SetupOutcome,
    SetupParam, SharedState, StartOutcome, StartParam,
};
use tracing::{debug, info};

use super::memorydb::{MemoryDb, STORE_KEY};

/// Key the greeter is shared under.
pub const GREETER_KEY: &str = "greeter";

const DEFAULT_GREETING: &str = "Hello";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeter {
    pub greeting: String,
    pub verbose: bool,
}

impl Greeter {
    fn from_config(config: Option<&DivisionConfig>) -> Self {
        Self {
            greeting: config
                .and_then(|config| config.get_str("GREETING"))
                .unwrap_or(DEFAULT_GREETING)
                .to_string(),
            verbose: config
                .and_then(|config| config.get_bool("HELLO_VERBOSE"))
                .unwrap_or(false),
        }
    }

    #[must_use]
    pub fn greet(&self, name: &str) -> String {
        format!("{}, {name}!", self.greeting)
    }
}

pub fn division() -> DivisionModule {
    DivisionModule::new()
        .with_setup(setup)
        .with_commands(commands)
}

fn store(param: &SetupParam) -> anyhow::Result<Arc<MemoryDb>> {
    param
        .shared
        .lookup::<MemoryDb>("memorydb", STORE_KEY)
        .ok_or_else(|| anyhow::anyhow!("hello needs the memorydb store"))
}

async fn setup(param: SetupParam) -> anyhow::Result<SetupOutcome> {
    let db = store(&param)?;
    let greeter = Greeter::from_config(param.config.as_ref());
    debug!(division = %param.name, greeting = %greeter.greeting, "Greeter configured");

    Ok(SetupOutcome::new()
        .with_shared(SharedState::new().with(GREETER_KEY, greeter.clone()))
        .with_start(move |start: StartParam| start_division(start, greeter, db)))
}

async fn start_division(
    start: StartParam,
    greeter: Greeter,
    db: Arc<MemoryDb>,
) -> anyhow::Result<StartOutcome> {
    // The store is shared by handle, so users added since setup show up too
    for user in db.users() {
        info!("{}", greeter.greet(&user.name));
    }

    if greeter.verbose {
        let visible: Vec<&str> = start.shared.divisions().collect();
        info!(visible = ?visible, "hello started");
    }

    Ok(StartOutcome::new()
        .with_shared(SharedState::new().with("greeted", db.len()))
        .with_cleanup(|| async {
            info!("Goodbye!");
            Ok(())
        }))
}

async fn commands(param: CommandsParam) -> anyhow::Result<CommandGroup> {
    let db = store(&param.setup)?;
    let greeter = param
        .shared_from_setup
        .and_then(|shared| shared.get::<Greeter>(GREETER_KEY))
        .unwrap_or_else(|| Arc::new(Greeter::from_config(param.setup.config.as_ref())));

    Ok(CommandGroup::new().command(
        CommandSpec::new("greet", move |args: Vec<String>| {
            let db = Arc::clone(&db);
            let greeter = Arc::clone(&greeter);
            async move {
                let names = if args.is_empty() {
                    db.users().into_iter().map(|user| user.name).collect()
                } else {
                    args
                };
                for name in names {
                    println!("{}", greeter.greet(&name));
                }
                Ok(())
            }
        })
        .describe("Greet the given names, or every stored user"),
    ))
}
