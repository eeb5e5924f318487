//! # Division Registry
//!
//! Holds every loaded division: its metadata, hooks, resolved configuration
//! and root path.
//!
//! ```text
//! LoadedDivision ──validate meta──→ DivisionRecord ──sort──→ DivisionRegistry
//!                                                     │
//!                                   resolve_order ◄───┘
//! ```
//!
//! Once [`DivisionRegistry::sort_by_dependencies`] has run, iteration order
//! is the resolver's order: every division after the divisions it depends
//! on.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use division_types::{
    meta_schema, CommandsHook, DivisionConfig, DivisionError, DivisionMeta, DivisionModule,
    SchemaViolation, SetupHook,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::environment::DeclaredSchema;
use crate::resolver::{resolve_order, DependencyNode};
use crate::validation::SchemaValidator;

/// A division module as produced by discovery, before validation.
#[derive(Debug, Clone)]
pub struct LoadedDivision {
    pub name: String,
    pub root_path: PathBuf,
    pub module: DivisionModule,
}

impl LoadedDivision {
    pub fn new(name: impl Into<String>, root_path: impl Into<PathBuf>, module: DivisionModule) -> Self {
        Self {
            name: name.into(),
            root_path: root_path.into(),
            module,
        }
    }
}

/// A validated division.
#[derive(Clone)]
pub struct DivisionRecord {
    pub name: String,
    pub root_path: PathBuf,
    /// Typed metadata; the default (no schema, no dependencies) when the
    /// division exported none.
    pub meta: DivisionMeta,
    pub setup: Option<SetupHook>,
    pub commands: Option<CommandsHook>,
    /// Present only if the division declared at least one env property.
    pub config: Option<DivisionConfig>,
}

impl DivisionRecord {
    /// Validate `loaded.module.metadata` and build the record.
    pub fn from_loaded(
        loaded: LoadedDivision,
        validator: &dyn SchemaValidator,
    ) -> Result<Self, DivisionError> {
        let LoadedDivision {
            name,
            root_path,
            module,
        } = loaded;

        let meta = match module.metadata {
            None | Some(Value::Null) => DivisionMeta::default(),
            Some(raw) => parse_metadata(&name, raw, validator)?,
        };

        Ok(Self {
            name,
            root_path,
            meta,
            setup: module.setup,
            commands: module.commands,
            config: None,
        })
    }

    pub fn depends_on(&self) -> &[String] {
        &self.meta.depends_on
    }
}

impl std::fmt::Debug for DivisionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DivisionRecord")
            .field("name", &self.name)
            .field("root_path", &self.root_path)
            .field("meta", &self.meta)
            .field("setup", &self.setup.is_some())
            .field("commands", &self.commands.is_some())
            .field("config", &self.config)
            .finish()
    }
}

fn parse_metadata(
    division: &str,
    raw: Value,
    validator: &dyn SchemaValidator,
) -> Result<DivisionMeta, DivisionError> {
    if let Err(violations) = validator.validate(&meta_schema(), &raw) {
        for violation in &violations {
            error!(
                division = division,
                instance_path = %violation.instance_path,
                "[Registry] Invalid meta: {}",
                violation.message
            );
        }
        return Err(DivisionError::InvalidMetadata {
            division: division.to_string(),
            violations,
        });
    }

    serde_json::from_value(raw).map_err(|e| DivisionError::InvalidMetadata {
        division: division.to_string(),
        violations: vec![SchemaViolation {
            instance_path: String::new(),
            message: e.to_string(),
        }],
    })
}

/// Registry of validated divisions.
#[derive(Debug, Default)]
pub struct DivisionRegistry {
    records: Vec<DivisionRecord>,
    index: HashMap<String, usize>,
    sorted: bool,
}

impl DivisionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every loaded division and register it, in input order.
    ///
    /// Fails on the first division whose metadata does not satisfy the
    /// metadata schema.
    pub fn from_loaded(
        divisions: Vec<LoadedDivision>,
        validator: &dyn SchemaValidator,
    ) -> Result<Self, DivisionError> {
        let mut registry = Self::new();
        for loaded in divisions {
            registry.insert(DivisionRecord::from_loaded(loaded, validator)?);
        }
        Ok(registry)
    }

    /// Register a division. A record with the same name is replaced in place.
    pub fn insert(&mut self, record: DivisionRecord) {
        debug!(division = %record.name, "[Registry] Registering division");

        if let Some(&position) = self.index.get(&record.name) {
            warn!(division = %record.name, "[Registry] Division registered twice, replacing");
            self.records[position] = record;
        } else {
            self.index.insert(record.name.clone(), self.records.len());
            self.records.push(record);
        }
        self.sorted = false;
    }

    /// Reorder the registry so every division follows its dependencies.
    ///
    /// # Errors
    ///
    /// [`DivisionError::Cycle`] if the `dependsOn` graph has a cycle. The
    /// registry is left unchanged in that case.
    pub fn sort_by_dependencies(&mut self) -> Result<(), DivisionError> {
        let nodes: Vec<DependencyNode> = self
            .records
            .iter()
            .map(|record| DependencyNode::new(record.name.clone(), record.depends_on().iter().cloned()))
            .collect();

        let order = resolve_order(&nodes)?;

        let mut by_name: HashMap<String, DivisionRecord> = self
            .records
            .drain(..)
            .map(|record| (record.name.clone(), record))
            .collect();

        self.records = order
            .iter()
            .filter_map(|name| by_name.remove(name))
            .collect();
        self.rebuild_index();
        self.sorted = true;

        info!("[Registry] Division order: {}", order.join(" -> "));
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.name.clone(), position))
            .collect();
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DivisionRecord> {
        self.index.get(name).map(|&position| &self.records[position])
    }

    /// Look up `name`, failing with [`DivisionError::MissingReference`].
    pub fn require(&self, name: &str) -> Result<&DivisionRecord, DivisionError> {
        self.get(name).ok_or_else(|| DivisionError::MissingReference {
            division: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DivisionRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|record| record.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Env schemas that declare at least one property, in registry order.
    #[must_use]
    pub fn declared_schemas(&self) -> Vec<DeclaredSchema> {
        self.records
            .iter()
            .filter_map(|record| {
                record
                    .meta
                    .env_schema_with_properties()
                    .map(|schema| DeclaredSchema::new(record.name.clone(), schema.clone()))
            })
            .collect()
    }

    /// Attach resolved configuration to each division.
    pub fn apply_configuration(&mut self, mut configs: BTreeMap<String, DivisionConfig>) {
        for record in &mut self.records {
            record.config = configs.remove(&record.name);
        }
    }
}
