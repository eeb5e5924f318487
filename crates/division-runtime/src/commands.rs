//! # Command Assembly
//!
//! Collects each division's command group after setup and builds the `div`
//! command tree:
//!
//! ```text
//! div
//! ├── memorydb            (group, named after the division by default)
//! │   └── list [args...]
//! └── hello
//!     └── greet [args...]
//! ```
//!
//! Leaf commands receive their trailing arguments unparsed.

use std::collections::HashMap;

use clap::{error::ErrorKind as ClapErrorKind, Arg, ArgAction, ArgMatches, Command};
use division_telemetry::{division_span, log_event};
use division_types::{CommandSpec, CommandsParam, DivisionError, HookPhase};
use tracing::{debug, warn, Instrument};

use crate::lifecycle::SetupRun;

/// Name of the top-level command.
pub const CLI_NAME: &str = "div";

/// Description of the top-level command.
pub const CLI_ABOUT: &str = "Commands exposed by each division";

const ARGS: &str = "args";

/// A division's command group with its display name and description
/// filled in.
#[derive(Debug, Clone)]
pub struct AssembledGroup {
    /// The division that produced the group.
    pub division: String,
    pub name: String,
    pub description: String,
    pub commands: Vec<CommandSpec>,
}

/// Default description of a division's command group.
#[must_use]
pub fn default_description(division: &str) -> String {
    format!("Commands from {division} division")
}

/// Call every commands hook, in registry order.
///
/// Each hook receives the division's setup param and the state its own
/// setup contributed.
///
/// # Errors
///
/// [`DivisionError::MissingSetupParam`] when a division with a commands
/// hook has no setup hook, and [`DivisionError::Hook`] with phase
/// `commands` for the first failing hook.
pub async fn assemble_commands(run: &SetupRun<'_>) -> Result<Vec<AssembledGroup>, DivisionError> {
    let mut groups = Vec::new();

    for record in run.registry().iter() {
        let Some(hook) = record.commands.as_ref() else {
            continue;
        };
        let division = record.name.as_str();

        let Some(setup) = run.setup_param(division).cloned() else {
            log_event!(error, division, "[Commands] Commands hook without setup");
            return Err(DivisionError::MissingSetupParam {
                division: division.to_string(),
            });
        };
        let param = CommandsParam {
            setup,
            shared_from_setup: run.shared_of(division).cloned(),
        };

        let group = hook(param)
            .instrument(division_span!("division_commands", division = division))
            .await
            .map_err(|source| {
                log_event!(error, division, "[Commands] Commands hook failed", error = %source);
                DivisionError::Hook {
                    division: division.to_string(),
                    phase: HookPhase::Commands,
                    source,
                }
            })?;

        let assembled = AssembledGroup {
            division: division.to_string(),
            name: group
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| division.to_string()),
            description: group
                .description
                .filter(|description| !description.is_empty())
                .unwrap_or_else(|| default_description(division)),
            commands: group.commands,
        };

        log_event!(
            debug,
            division,
            "[Commands] Assembled command group",
            group = %assembled.name,
            commands = assembled.commands.len()
        );
        groups.push(assembled);
    }

    Ok(groups)
}

/// The `div` command tree and its dispatcher.
#[derive(Debug, Clone)]
pub struct DivisionCli {
    groups: Vec<AssembledGroup>,
}

impl DivisionCli {
    /// Build the CLI. A group whose name is already taken replaces the
    /// earlier group in place; the same holds for leaf commands in a group.
    #[must_use]
    pub fn new(groups: Vec<AssembledGroup>) -> Self {
        let mut groups = dedupe_by_name(groups, |group| &group.name, "group");
        for group in &mut groups {
            let commands = std::mem::take(&mut group.commands);
            group.commands = dedupe_by_name(commands, |command| &command.name, "command");
        }
        Self { groups }
    }

    #[must_use]
    pub fn groups(&self) -> &[AssembledGroup] {
        &self.groups
    }

    /// The clap command tree.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut root = Command::new(CLI_NAME).about(CLI_ABOUT);
        if !self.groups.is_empty() {
            root = root.subcommand_required(true).arg_required_else_help(true);
        }

        for group in &self.groups {
            let mut sub = Command::new(group.name.clone()).about(group.description.clone());
            if !group.commands.is_empty() {
                sub = sub.subcommand_required(true).arg_required_else_help(true);
            }

            for command in &group.commands {
                let mut leaf = Command::new(command.name.clone()).arg(
                    Arg::new(ARGS)
                        .action(ArgAction::Append)
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                );
                if let Some(description) = &command.description {
                    leaf = leaf.about(description.clone());
                }
                sub = sub.subcommand(leaf);
            }

            root = root.subcommand(sub);
        }

        root
    }

    /// Parse `args` (including the binary name) and run the selected leaf
    /// command. Help and version requests are printed and succeed.
    pub async fn run<I, T>(&self, args: I) -> Result<(), DivisionError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = match self.command().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
                e.print().map_err(|io| DivisionError::Cli(io.to_string()))?;
                return Ok(());
            }
            Err(e) => return Err(DivisionError::Cli(e.to_string())),
        };

        self.dispatch(&matches).await
    }

    /// Run the leaf command selected in `matches`.
    pub async fn dispatch(&self, matches: &ArgMatches) -> Result<(), DivisionError> {
        let Some((group_name, group_matches)) = matches.subcommand() else {
            return Err(DivisionError::Cli("no division selected".into()));
        };
        let group = self
            .groups
            .iter()
            .find(|group| group.name == group_name)
            .ok_or_else(|| DivisionError::Cli(format!("unknown division '{group_name}'")))?;

        let Some((command_name, command_matches)) = group_matches.subcommand() else {
            return Err(DivisionError::Cli(format!("no command selected for '{group_name}'")));
        };
        let command = group
            .commands
            .iter()
            .find(|command| command.name == command_name)
            .ok_or_else(|| {
                DivisionError::Cli(format!("unknown command '{group_name} {command_name}'"))
            })?;

        let args: Vec<String> = command_matches
            .get_many::<String>(ARGS)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        log_event!(
            info,
            group.division.as_str(),
            "[Commands] Running command",
            command = %command.name
        );

        (command.handler)(args).await.map_err(|source| DivisionError::Hook {
            division: group.division.clone(),
            phase: HookPhase::Command,
            source,
        })
    }
}

fn dedupe_by_name<T>(items: Vec<T>, name_of: impl Fn(&T) -> &String, what: &str) -> Vec<T> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let name = name_of(&item).clone();
        if let Some(&position) = positions.get(&name) {
            warn!("[Commands] Duplicate {what} '{name}', the later one replaces it");
            unique[position] = item;
        } else {
            debug!("[Commands] Registering {what} '{name}'");
            positions.insert(name, unique.len());
            unique.push(item);
        }
    }

    unique
}
