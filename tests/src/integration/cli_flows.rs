//! # CLI Flows
//!
//! Command groups assembled after setup and dispatched through the `div`
//! command tree.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::integration::fixtures::{no_env, write_division};
    use division_demo::{MemoryDb, STORE_KEY};
    use division_runtime::{
        run_division_cli, CommandGroup, CommandSpec, CommandsParam, DivisionCatalog,
        DivisionCli, DivisionError, DivisionModule, Divisions, DivisionsOptions, HookPhase,
        JsonSchemaValidator, SetupOutcome, SetupParam, CLI_ABOUT, CLI_NAME,
    };
    use parking_lot::Mutex;

    async fn no_setup(_param: SetupParam) -> anyhow::Result<SetupOutcome> {
        Ok(SetupOutcome::new())
    }

    fn demo_options() -> DivisionsOptions {
        DivisionsOptions::new().with_divisions_path(division_demo::divisions_dir())
    }

    #[tokio::test]
    async fn test_demo_groups_get_defaults() {
        let divisions = Divisions::create_with(
            demo_options(),
            &division_demo::catalog(),
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        let groups = divisions.commands_by_division().await.unwrap();

        let summary: Vec<_> = groups
            .iter()
            .map(|group| (group.name.as_str(), group.description.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("memorydb", "Inspect the in-memory user table"),
                ("hello", "Commands from hello division"),
            ]
        );

        let cli = DivisionCli::new(groups).command();
        assert_eq!(cli.get_name(), CLI_NAME);
        assert_eq!(cli.get_about().map(ToString::to_string), Some(CLI_ABOUT.to_string()));
        cli.debug_assert();
    }

    #[tokio::test]
    async fn test_demo_add_command_writes_to_store() {
        let divisions = Divisions::create_with(
            demo_options(),
            &division_demo::catalog(),
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        let run = divisions.setup_all().await.unwrap();
        let db = run
            .shared_of("memorydb")
            .and_then(|shared| shared.get::<MemoryDb>(STORE_KEY))
            .unwrap();

        let groups = division_runtime::assemble_commands(&run).await.unwrap();
        DivisionCli::new(groups)
            .run(["div", "memorydb", "add", "Alice", "Bob"])
            .await
            .unwrap();

        let names: Vec<_> = db.users().into_iter().map(|user| user.name).collect();
        assert_eq!(names, vec!["John", "Jane", "Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_run_division_cli_dispatches_to_handler() {
        let calls: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "jobs", None);

        let recorded = Arc::clone(&calls);
        let catalog = DivisionCatalog::new().register("jobs", move || {
            let recorded = Arc::clone(&recorded);
            DivisionModule::new().with_setup(no_setup).with_commands(move |_param: CommandsParam| {
                let recorded = Arc::clone(&recorded);
                async move {
                    Ok(CommandGroup::new().named("queue").command(CommandSpec::new(
                        "push",
                        move |args: Vec<String>| {
                            let recorded = Arc::clone(&recorded);
                            async move {
                                recorded.lock().push(args);
                                Ok(())
                            }
                        },
                    )))
                }
            })
        });

        run_division_cli(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog,
            ["div", "queue", "push", "email", "--priority=high"],
        )
        .await
        .unwrap();

        assert_eq!(
            *calls.lock(),
            vec![vec!["email".to_string(), "--priority=high".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_commands_hook_needs_a_setup_hook() {
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "orphan", None);

        let catalog = DivisionCatalog::new().register("orphan", || {
            DivisionModule::new().with_commands(|_param: CommandsParam| async {
                Ok(CommandGroup::new())
            })
        });

        let err = run_division_cli(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog,
            ["div", "--help"],
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Division orphan has no setup param");
        assert_eq!(err.division(), Some("orphan"));
    }

    #[tokio::test]
    async fn test_failing_commands_hook_names_division() {
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "flaky", None);

        let catalog = DivisionCatalog::new().register("flaky", || {
            DivisionModule::new().with_setup(no_setup).with_commands(|_param: CommandsParam| async {
                Err::<CommandGroup, _>(anyhow::anyhow!("registry offline"))
            })
        });

        let divisions = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog,
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        let err = divisions.commands_by_division().await.unwrap_err();
        assert!(matches!(
            err,
            DivisionError::Hook { ref division, phase: HookPhase::Commands, .. } if division == "flaky"
        ));
    }
}
