//! Model definitions, field declarations and their validation.
//!
//! This module holds the data types a client submits at runtime, the
//! declarative schema language field types use to describe their
//! declarations, the field type registry, and the two top-level validators.
//!
//! # Key Types
//!
//! - [`ModelDefinition`] - a runtime model: title, description, ordered fields
//! - [`FieldDeclaration`] - one field of a model, typed by a registered name
//! - [`TypeRegistry`] - registry of field types
//! - [`Schema`] - the shape a field declaration must have
//! - [`DefinitionValidator`] / [`RecordValidator`] - the validators
//!
//! # Examples
//!
//! ```rust
//! use dynamic_models::schema::{DefinitionValidator, TypeRegistry};
//! use dynamic_models::fields::ValidationContext;
//! use dynamic_models::storage::InMemoryStorage;
//! use serde_json::json;
//!
//! let registry = TypeRegistry::with_builtin_types();
//! let store = InMemoryStorage::new();
//! let validator = DefinitionValidator::new(ValidationContext::new(&registry, &store));
//!
//! let definition = validator
//!     .validate(&json!({
//!         "title": "Tree",
//!         "description": "A tree in the city",
//!         "fields": [{"name": "height", "type": "decimal"}]
//!     }))
//!     .unwrap();
//! assert_eq!(definition.fields[0].type_name, "decimal");
//! ```

pub mod definition;
pub mod registry;
pub mod types;
pub mod validation;


pub use definition::{
    Presence, ROOT_PATH, Schema, SchemaKey, SchemaNode, SchemaRule, anchored_pattern,
};
pub use registry::TypeRegistry;
pub use types::{CleanRecord, FieldDeclaration, ModelDefinition};
pub use validation::{DefinitionValidator, RecordValidator};
