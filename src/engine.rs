//! Validation engine: configuration, builder and entry points.
//!
//! A [`ValidationEngine`] bundles a populated [`TypeRegistry`] with the
//! engine limits. It is built once at startup, read-only afterwards, and is
//! shared across request handlers by reference or `Arc`.

use crate::error::{BuildError, BuildResult, ValidationErrors};
use crate::fields::{FieldType, ValidationContext, builtin_types};
use crate::schema::{
    CleanRecord, DefinitionValidator, ModelDefinition, RecordValidator, TypeRegistry,
};
use crate::storage::ModelStore;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// Default maximum nesting of object/list declarations.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default pattern every field name must match.
pub const DEFAULT_FIELD_NAME_PATTERN: &str = "^[a-zA-Z][a-zA-Z0-9_]*$";

pub(crate) static DEFAULT_FIELD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_FIELD_NAME_PATTERN).expect("default field name pattern is valid")
});

/// Engine limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum nesting of object/list declarations.
    pub max_depth: usize,

    /// Pattern every declared field name must match.
    pub field_name_pattern: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            field_name_pattern: DEFAULT_FIELD_NAME_PATTERN.to_string(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration, returning the compiled field name pattern.
    pub fn validate(&self) -> BuildResult<Regex> {
        if self.max_depth == 0 {
            return Err(BuildError::configuration("max_depth must be at least 1"));
        }

        if self.field_name_pattern.is_empty() {
            return Err(BuildError::configuration("field name pattern cannot be empty"));
        }

        Regex::new(&self.field_name_pattern).map_err(|e| {
            BuildError::configuration(format!(
                "invalid field name pattern '{}': {}",
                self.field_name_pattern, e
            ))
        })
    }
}

/// Validates model definitions and records.
///
/// # Examples
///
/// ```rust
/// use dynamic_models::{InMemoryStorage, ValidationEngine};
/// use serde_json::json;
///
/// let engine = ValidationEngine::new();
/// let store = InMemoryStorage::new();
///
/// let definition = engine
///     .validate_definition(
///         &json!({
///             "title": "T",
///             "description": "d",
///             "fields": [{"name": "age", "type": "int", "required": false}]
///         }),
///         &store,
///     )
///     .unwrap();
///
/// let clean = engine.validate_record(&definition, &json!({"age": "30"}), &store).unwrap();
/// assert_eq!(clean["age"], json!(30));
/// ```
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    registry: TypeRegistry,
    config: EngineConfig,
    field_name: Regex,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Create an engine with every built-in field type and default limits.
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::with_builtin_types(),
            config: EngineConfig::default(),
            field_name: DEFAULT_FIELD_NAME.clone(),
        }
    }

    /// Start configuring an engine.
    pub fn builder() -> ValidationEngineBuilder {
        ValidationEngineBuilder::new()
    }

    /// The field type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The engine limits.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered field type names, sorted.
    pub fn field_types(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Validation context for one call against `store`.
    pub fn context<'a>(&'a self, store: &'a dyn ModelStore) -> ValidationContext<'a> {
        ValidationContext::new(&self.registry, store)
            .with_limits(&self.field_name, self.config.max_depth)
    }

    /// Validate a proposed model definition.
    pub fn validate_definition(
        &self,
        raw: &Value,
        store: &dyn ModelStore,
    ) -> Result<ModelDefinition, ValidationErrors> {
        let definition = DefinitionValidator::new(self.context(store)).validate(raw)?;
        debug!(
            "Accepted model definition '{}' with {} fields",
            definition.title,
            definition.fields.len()
        );
        Ok(definition)
    }

    /// Validate a record against a definition.
    ///
    /// Fields whose validator cannot be built (for example an `object` field
    /// referencing a deleted model) are reported as field errors alongside the
    /// value errors.
    pub fn validate_record(
        &self,
        definition: &ModelDefinition,
        raw: &Value,
        store: &dyn ModelStore,
    ) -> Result<CleanRecord, ValidationErrors> {
        let (validator, build_errors) =
            RecordValidator::lenient(&definition.fields, self.context(store));
        validator.validate_with(raw, build_errors).inspect_err(|errors| {
            debug!(
                "Rejected record for '{}' with {} error(s)",
                definition.title,
                errors.len()
            );
        })
    }

    /// Build the validator chain for a definition, failing fast.
    ///
    /// Use this to check that every reference of a definition still resolves,
    /// or to validate many records against one definition.
    pub fn record_validator<'a>(
        &'a self,
        definition: &ModelDefinition,
        store: &'a dyn ModelStore,
    ) -> BuildResult<RecordValidator<'a>> {
        RecordValidator::new(&definition.fields, self.context(store))
    }
}

/// Builder for configuring a [`ValidationEngine`].
///
/// Starts with an empty registry; call
/// [`with_builtin_types`](Self::with_builtin_types) to add the built-in field
/// types.
///
/// # Examples
///
/// ```rust
/// use dynamic_models::ValidationEngine;
/// use dynamic_models::fields::StringField;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = ValidationEngine::builder()
///     .with_builtin_types()
///     .without_type("geojson")
///     .register_type("slug", StringField)
///     .with_max_depth(4)
///     .build()?;
///
/// assert!(engine.field_types().contains(&"slug".to_string()));
/// assert!(!engine.field_types().contains(&"geojson".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ValidationEngineBuilder {
    registry: TypeRegistry,
    config: EngineConfig,
    problems: Vec<String>,
}

impl ValidationEngineBuilder {
    /// Create a builder with an empty registry and default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every built-in field type.
    pub fn with_builtin_types(mut self) -> Self {
        for (name, field_type) in builtin_types() {
            if let Err(e) = self.registry.register_arc(name, field_type) {
                self.problems.push(e.to_string());
            }
        }
        self
    }

    /// Register a field type.
    pub fn register_type(
        self,
        name: impl Into<String>,
        field_type: impl FieldType + 'static,
    ) -> Self {
        self.register_shared(name, Arc::new(field_type))
    }

    /// Register a shared field type.
    pub fn register_shared(
        mut self,
        name: impl Into<String>,
        field_type: Arc<dyn FieldType>,
    ) -> Self {
        if let Err(e) = self.registry.register_arc(name, field_type) {
            self.problems.push(e.to_string());
        }
        self
    }

    /// Remove a previously registered field type.
    pub fn without_type(mut self, name: &str) -> Self {
        if let Err(e) = self.registry.unregister(name) {
            self.problems.push(e.to_string());
        }
        self
    }

    /// Set the maximum nesting of object/list declarations.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the pattern every field name must match.
    pub fn with_field_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.field_name_pattern = pattern.into();
        self
    }

    /// Build the engine.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Configuration`] if a registration step failed or
    /// the limits are invalid.
    pub fn build(self) -> BuildResult<ValidationEngine> {
        if !self.problems.is_empty() {
            return Err(BuildError::configuration(self.problems.join("; ")));
        }
        let field_name = self.config.validate()?;
        info!(
            "Validation engine ready with {} field types (max depth {})",
            self.registry.len(),
            self.config.max_depth
        );
        Ok(ValidationEngine {
            registry: self.registry,
            config: self.config,
            field_name,
        })
    }
}
