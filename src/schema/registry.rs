//! Registry of field types.
//!
//! The [`TypeRegistry`] maps a type name (the `type` of a field declaration)
//! to its [`FieldType`] implementation. It is populated once at startup and
//! only read afterwards; lookups take `&self` so a built registry can be
//! shared across threads.

use super::definition::Schema;
use super::types::FieldDeclaration;
use crate::error::{BuildResult, RegistryError, RegistryResult};
use crate::fields::{self, FieldType, FieldValidator, ValidationContext};
use log::{debug, trace};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of field types available to model definitions.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn FieldType>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in field type.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        for (name, field_type) in fields::builtin_types() {
            registry.types.insert(name.to_string(), field_type);
        }
        debug!("Registered {} built-in field types", registry.types.len());
        registry
    }

    /// Register a field type under `name`.
    ///
    /// Registering the same name twice is an error; use [`unregister`](Self::unregister)
    /// first to replace a type.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        field_type: impl FieldType + 'static,
    ) -> RegistryResult<()> {
        self.register_arc(name, Arc::new(field_type))
    }

    /// Register a shared field type under `name`.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        field_type: Arc<dyn FieldType>,
    ) -> RegistryResult<()> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }
        debug!("Registering field type '{}'", name);
        self.types.insert(name, field_type);
        Ok(())
    }

    /// Remove a field type, returning it.
    pub fn unregister(&mut self, name: &str) -> RegistryResult<Arc<dyn FieldType>> {
        let removed = self.types.remove(name).ok_or_else(|| RegistryError::NotRegistered {
            name: name.to_string(),
        })?;
        debug!("Unregistered field type '{}'", name);
        Ok(removed)
    }

    /// Get a field type by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FieldType>> {
        self.types.get(name)
    }

    /// Check whether a field type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    fn lookup(&self, name: &str) -> RegistryResult<&Arc<dyn FieldType>> {
        self.types.get(name).ok_or_else(|| RegistryError::UnknownFieldType {
            name: name.to_string(),
        })
    }

    /// Schema a declaration of type `name` must satisfy.
    pub fn definition_schema(
        &self,
        name: &str,
        options: &Map<String, Value>,
    ) -> RegistryResult<Schema> {
        Ok(self.lookup(name)?.definition(options))
    }

    /// Build the value validator for a declaration.
    pub fn validator<'a>(
        &self,
        declaration: &FieldDeclaration,
        ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let field_type = self.lookup(&declaration.type_name)?;
        trace!(
            "Building validator for field '{}' of type '{}' at depth {}",
            declaration.display_name(),
            declaration.type_name,
            ctx.depth()
        );
        field_type.validation(declaration, ctx)
    }

    /// Describe a field type for capability listings:
    /// `{"name": ..., "node": ..., "keys": [...]}`.
    pub fn describe(&self, name: &str) -> RegistryResult<Value> {
        let field_type = self.lookup(name)?;
        Ok(json!({
            "name": name,
            "node": field_type.node().as_str(),
            "keys": field_type.definition(&Map::new()).to_json(),
        }))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}
