//! # Lifecycle Flows
//!
//! Discovery through cleanup, driven through the public engine API:
//!
//! 1. **Ordering**: hooks run dependency-first, cleanup follows collection
//!    order unless reverse order is requested
//! 2. **Visibility**: each hook sees only its direct dependencies' state
//! 3. **Failure**: pre-flight errors stop the engine before any hook runs
//! 4. **Reruns**: every start re-invokes every hook

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{entries, journal, no_env, traced, write_division, Journal};
    use division_demo::{MemoryDb, STORE_KEY};
    use division_runtime::{
        start_divisions, CleanupOrder, DivisionCatalog, DivisionError, DivisionModule, Divisions,
        DivisionsOptions, HookPhase, JsonSchemaValidator, LifecycleState, SetupOutcome,
        SetupParam,
    };
    use serde_json::json;

    // =========================================================================
    // EXAMPLE DIVISIONS
    // =========================================================================

    fn demo_options() -> DivisionsOptions {
        DivisionsOptions::new().with_divisions_path(division_demo::divisions_dir())
    }

    #[tokio::test]
    async fn test_hello_sees_memorydb_store() {
        let divisions = Divisions::create_with(
            demo_options(),
            &division_demo::catalog(),
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        assert_eq!(divisions.registry().names(), vec!["memorydb", "hello"]);

        let run = divisions.setup_all().await.unwrap();
        let hello = run.setup_param("hello").unwrap();
        assert_eq!(hello.shared.divisions().collect::<Vec<_>>(), vec!["memorydb"]);
        assert!(hello.config.as_ref().is_some_and(|config| config.is_empty()));

        let db = hello.shared.lookup::<MemoryDb>("memorydb", STORE_KEY).unwrap();
        assert_eq!(db.len(), 2);

        let cleanup = run.start_all().await.unwrap();
        assert_eq!(cleanup.divisions(), vec!["memorydb", "hello"]);

        let ledger = cleanup.run().await.unwrap();
        assert_eq!(ledger.state_of("hello"), Some(LifecycleState::CleanedUp));
        // memorydb's cleanup empties the shared table
        assert!(db.is_empty());
    }

    #[tokio::test]
    async fn test_start_divisions_then_cleanup() {
        let running = start_divisions(demo_options(), &division_demo::catalog())
            .await
            .unwrap();

        assert_eq!(running.pending_cleanups(), vec!["memorydb", "hello"]);
        assert_eq!(running.divisions().registry().len(), 2);

        let ledger = running.cleanup().await.unwrap();
        assert_eq!(ledger.state_of("memorydb"), Some(LifecycleState::CleanedUp));
    }

    // =========================================================================
    // ORDERING AND VISIBILITY
    // =========================================================================

    fn chain_catalog(journal: &Journal) -> DivisionCatalog {
        let (a, b, c, d) = (
            traced("api", journal),
            traced("auth", journal),
            traced("db", journal),
            traced("metrics", journal),
        );
        DivisionCatalog::new()
            .register("api", move || a.clone())
            .register("auth", move || b.clone())
            .register("db", move || c.clone())
            .register("metrics", move || d.clone())
    }

    fn chain_dir() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "api", Some(json!({ "dependsOn": ["auth"] })));
        write_division(root.path(), "auth", Some(json!({ "dependsOn": ["db"] })));
        write_division(root.path(), "db", None);
        write_division(root.path(), "metrics", Some(json!({})));
        root
    }

    #[tokio::test]
    async fn test_discovered_chain_runs_dependency_first() {
        let journal = journal();
        let root = chain_dir();
        let divisions = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &chain_catalog(&journal),
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        assert_eq!(
            divisions.registry().names(),
            vec!["db", "auth", "api", "metrics"]
        );

        divisions.start().await.unwrap().run().await.unwrap();

        assert_eq!(
            entries(&journal),
            vec![
                "setup:db[]",
                "setup:auth[db]",
                "setup:api[auth]",
                "setup:metrics[]",
                "start:db[]",
                "start:auth[db]",
                "start:api[auth]",
                "start:metrics[]",
                "cleanup:db",
                "cleanup:auth",
                "cleanup:api",
                "cleanup:metrics",
            ]
        );
    }

    #[tokio::test]
    async fn test_reverse_cleanup_is_opt_in() {
        let journal = journal();
        let root = chain_dir();
        let divisions = Divisions::create_with(
            DivisionsOptions::new()
                .with_divisions_path(root.path())
                .with_cleanup_order(CleanupOrder::Reverse),
            &chain_catalog(&journal),
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        divisions.start().await.unwrap().run().await.unwrap();

        let cleanups: Vec<String> = entries(&journal)
            .into_iter()
            .filter(|entry| entry.starts_with("cleanup:"))
            .collect();
        assert_eq!(
            cleanups,
            vec!["cleanup:metrics", "cleanup:api", "cleanup:auth", "cleanup:db"]
        );
    }

    #[tokio::test]
    async fn test_rerun_invokes_every_hook_again() {
        let journal = journal();
        let root = chain_dir();
        let divisions = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &chain_catalog(&journal),
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        divisions.start().await.unwrap().run().await.unwrap();
        let first = entries(&journal);
        divisions.start().await.unwrap().run().await.unwrap();
        let both = entries(&journal);

        assert_eq!(both.len(), first.len() * 2);
        assert_eq!(&both[first.len()..], first.as_slice());
    }

    #[tokio::test]
    async fn test_unregistered_directory_is_excluded() {
        let journal = journal();
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "db", None);
        write_division(root.path(), "legacy", None);
        write_division(
            root.path(),
            "auth",
            Some(json!({ "dependsOn": ["db", "legacy"] })),
        );

        let catalog = DivisionCatalog::new()
            .register("db", {
                let module = traced("db", &journal);
                move || module.clone()
            })
            .register("auth", {
                let module = traced("auth", &journal);
                move || module.clone()
            });

        let divisions = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog,
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();

        assert_eq!(divisions.registry().names(), vec!["db", "auth"]);
        divisions.setup_all().await.unwrap();
        assert_eq!(entries(&journal), vec!["setup:db[]", "setup:auth[db]"]);
    }

    // =========================================================================
    // FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_cycle_prevents_every_hook() {
        let journal = journal();
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "a", Some(json!({ "dependsOn": ["c"] })));
        write_division(root.path(), "b", Some(json!({ "dependsOn": ["a"] })));
        write_division(root.path(), "c", Some(json!({ "dependsOn": ["b"] })));

        let catalog = ["a", "b", "c"]
            .into_iter()
            .fold(DivisionCatalog::new(), |catalog, name| {
                let module = traced(name, &journal);
                catalog.register(name, move || module.clone())
            });

        let err = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog,
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap_err();

        assert!(err.is_preflight());
        assert_eq!(err.to_string(), "Circular dependency detected: a -> c -> b -> a");
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_meta_file_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "db", Some(json!({ "dependsOn": [42] })));

        let catalog = DivisionCatalog::new().register("db", DivisionModule::new);
        let err = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog,
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DivisionError::InvalidMetadata { ref division, .. } if division == "db"));
    }

    #[tokio::test]
    async fn test_setup_failure_skips_start_phase() {
        let journal = journal();
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "db", None);
        write_division(root.path(), "broken", Some(json!({ "dependsOn": ["db"] })));

        let catalog = DivisionCatalog::new()
            .register("db", {
                let module = traced("db", &journal);
                move || module.clone()
            })
            .register("broken", || {
                DivisionModule::new().with_setup(|_param: SetupParam| async {
                    Err::<SetupOutcome, _>(anyhow::anyhow!("disk full"))
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

        let err = divisions.start().await.unwrap_err();

        assert!(matches!(
            err,
            DivisionError::Hook { ref division, phase: HookPhase::Setup, .. } if division == "broken"
        ));
        assert!(!err.is_preflight());
        // db's setup ran, but no start hook did
        assert_eq!(entries(&journal), vec!["setup:db[]"]);
    }
}
