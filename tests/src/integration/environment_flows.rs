//! # Environment Flows
//!
//! Declared env schemas, validated once for every division and split back
//! into per-division configuration.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use crate::integration::fixtures::{env, no_env, write_division};
    use division_runtime::{
        DivisionCatalog, DivisionConfig, DivisionError, DivisionModule, Divisions,
        DivisionsOptions, DotenvEnvironment, JsonSchemaValidator, SetupOutcome, SetupParam,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    type Seen = Arc<Mutex<Vec<(String, Option<DivisionConfig>)>>>;

    /// A division recording the configuration its setup receives.
    fn recording(seen: &Seen) -> DivisionModule {
        let seen = Arc::clone(seen);
        DivisionModule::new().with_setup(move |param: SetupParam| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().push((param.name.clone(), param.config.clone()));
                Ok(SetupOutcome::new())
            }
        })
    }

    fn catalog(names: &[&str], seen: &Seen) -> DivisionCatalog {
        names.iter().fold(DivisionCatalog::new(), |catalog, name| {
            let module = recording(seen);
            catalog.register(*name, move || module.clone())
        })
    }

    fn config_of(seen: &Seen, division: &str) -> Option<DivisionConfig> {
        seen.lock()
            .iter()
            .find(|(name, _)| name == division)
            .and_then(|(_, config)| config.clone())
    }

    fn password_meta() -> Value {
        json!({
            "envSchema": {
                "type": "object",
                "properties": { "PASSWORD": { "type": "string" } },
                "required": ["PASSWORD"]
            }
        })
    }

    #[tokio::test]
    async fn test_password_reaches_declaring_division_only() {
        let seen = Seen::default();
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "hello", Some(password_meta()));
        write_division(root.path(), "world", None);

        let divisions = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog(&["hello", "world"], &seen),
            &env(&[("PASSWORD", "secret"), ("UNRELATED", "x")]),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();
        divisions.setup_all().await.unwrap();

        let hello = config_of(&seen, "hello").unwrap();
        assert_eq!(hello.get_str("PASSWORD"), Some("secret"));
        assert_eq!(hello.len(), 1);
        assert!(config_of(&seen, "world").is_none());
    }

    #[tokio::test]
    async fn test_missing_required_value_fails_before_setup() {
        let seen = Seen::default();
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "hello", Some(password_meta()));

        let err = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog(&["hello"], &seen),
            &no_env(),
            &JsonSchemaValidator,
        )
        .await
        .unwrap_err();

        assert!(err.is_preflight());
        match err {
            DivisionError::InvalidEnvironment { violations } => {
                assert!(violations.iter().any(|v| v.message.contains("PASSWORD")));
            }
            other => panic!("Expected InvalidEnvironment, got {other:?}"),
        }
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_values_are_coerced_per_schema() {
        let seen = Seen::default();
        let root = tempfile::tempdir().unwrap();
        write_division(
            root.path(),
            "server",
            Some(json!({
                "envSchema": {
                    "type": "object",
                    "properties": {
                        "PORT": { "type": "integer", "minimum": 1024 },
                        "DEBUG": { "type": "boolean" },
                        "RATIO": { "type": "number" }
                    }
                }
            })),
        );

        let divisions = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog(&["server"], &seen),
            &env(&[("PORT", "8080"), ("DEBUG", "false"), ("RATIO", "0.25")]),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();
        divisions.setup_all().await.unwrap();

        let config = config_of(&seen, "server").unwrap();
        assert_eq!(config.get_i64("PORT"), Some(8080));
        assert_eq!(config.get_bool("DEBUG"), Some(false));
        assert_eq!(config.get_f64("RATIO"), Some(0.25));
    }

    #[tokio::test]
    async fn test_no_schema_means_no_configuration() {
        let seen = Seen::default();
        let root = tempfile::tempdir().unwrap();
        write_division(root.path(), "plain", Some(json!({ "dependsOn": [] })));

        let divisions = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(root.path()),
            &catalog(&["plain"], &seen),
            &env(&[("PASSWORD", "secret")]),
            &JsonSchemaValidator,
        )
        .await
        .unwrap();
        divisions.setup_all().await.unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert!(config_of(&seen, "plain").is_none());
    }

    #[tokio::test]
    async fn test_env_file_supplies_declared_values() {
        let seen = Seen::default();
        let root = tempfile::tempdir().unwrap();
        write_division(
            root.path(),
            "api",
            Some(json!({
                "envSchema": {
                    "type": "object",
                    "properties": {
                        "DIVISION_TESTS_API_TOKEN": { "type": "string", "minLength": 8 }
                    }
                }
            })),
        );

        let mut env_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(env_file, "DIVISION_TESTS_API_TOKEN=0123456789abcdef").unwrap();

        let options = DivisionsOptions::new()
            .with_divisions_path(root.path())
            .with_env_path(env_file.path());
        let source = DotenvEnvironment::new(options.env_path.clone());

        let divisions = Divisions::create_with(
            options,
            &catalog(&["api"], &seen),
            &source,
            &JsonSchemaValidator,
        )
        .await
        .unwrap();
        divisions.setup_all().await.unwrap();

        assert_eq!(
            config_of(&seen, "api").unwrap().get_str("DIVISION_TESTS_API_TOKEN"),
            Some("0123456789abcdef")
        );
    }

    #[tokio::test]
    async fn test_demo_greeting_is_validated() {
        let err = Divisions::create_with(
            DivisionsOptions::new().with_divisions_path(division_demo::divisions_dir()),
            &division_demo::catalog(),
            &env(&[("HELLO_VERBOSE", "sometimes")]),
            &JsonSchemaValidator,
        )
        .await
        .unwrap_err();

        match err {
            DivisionError::InvalidEnvironment { violations } => {
                assert!(violations.iter().any(|v| v.instance_path == "/HELLO_VERBOSE"));
            }
            other => panic!("Expected InvalidEnvironment, got {other:?}"),
        }
    }
}
