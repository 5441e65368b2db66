//! Process-wide model registry.
//!
//! Descriptors are derived once, before the system accepts query traffic,
//! and are read-only for the remainder of the process. The one-time
//! initialization barrier is a `OnceLock`; concurrent readers need no
//! locking.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use crate::domain::default_models;
use crate::error::SchemaError;
use crate::model::{ModelDescriptor, ModelSpec};

static GLOBAL: OnceLock<ModelRegistry> = OnceLock::new();

/// Immutable registry of model descriptors, keyed by table name.
#[derive(Debug)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelDescriptor>,
    /// Union of all registered field names, the allow-list fast path.
    field_names: HashSet<String>,
}

impl ModelRegistry {
    /// Derive descriptors for every declared model and build the registry.
    pub fn build(specs: &[ModelSpec]) -> Result<Self, SchemaError> {
        let mut models = BTreeMap::new();
        let mut field_names = HashSet::new();

        for spec in specs {
            let descriptor = spec.derive()?;
            if models.contains_key(&descriptor.table) {
                return Err(SchemaError::DuplicateTable(descriptor.table.clone()));
            }
            for field in &descriptor.fields {
                field_names.insert(field.name.clone());
            }
            models.insert(descriptor.table.clone(), descriptor);
        }

        Ok(Self {
            models,
            field_names,
        })
    }

    /// Install a registry built from `specs` as the process-wide instance.
    ///
    /// Returns the built registry, or the already installed one if a
    /// previous call won the race. Must run before any request-handling
    /// path starts.
    pub fn install(specs: &[ModelSpec]) -> Result<&'static Self, SchemaError> {
        if let Some(existing) = GLOBAL.get() {
            return Ok(existing);
        }
        let built = Self::build(specs)?;
        Ok(GLOBAL.get_or_init(|| built))
    }

    /// The process-wide registry, installing the default domain models on
    /// first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            Self::build(&default_models()).expect("default domain models must derive")
        })
    }

    /// Look up a table's descriptor.
    pub fn model(&self, table: &str) -> Option<&ModelDescriptor> {
        self.models.get(table)
    }

    /// Whether any registered model declares a field with this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.field_names.contains(name)
    }

    /// All registered descriptors, in table-name order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }

    /// The model flagged as the graph node table.
    pub fn graph_node(&self) -> Result<&ModelDescriptor, SchemaError> {
        self.models
            .values()
            .find(|m| m.graph_node)
            .ok_or(SchemaError::NoGraphModel("node"))
    }

    /// The model flagged as the graph edge table.
    pub fn graph_edge(&self) -> Result<&ModelDescriptor, SchemaError> {
        self.models
            .values()
            .find(|m| m.graph_edge)
            .ok_or(SchemaError::NoGraphModel("edge"))
    }

    /// The first model carrying a vector field.
    pub fn vector_model(&self) -> Result<&ModelDescriptor, SchemaError> {
        self.models
            .values()
            .find(|m| m.vector_field.is_some())
            .ok_or(SchemaError::NoVectorField {
                table: "<any>".to_string(),
            })
    }

    /// The first model carrying a fulltext field.
    pub fn fulltext_model(&self) -> Result<&ModelDescriptor, SchemaError> {
        self.models
            .values()
            .find(|m| !m.fulltext_fields.is_empty())
            .ok_or(SchemaError::NoFulltextField {
                table: "<any>".to_string(),
            })
    }
}
