//! Dynamic schema and record validation for Rust.
//!
//! Lets clients define record schemas ("model definitions") at runtime and
//! validate records against them, with no compile-time knowledge of the
//! record shape. Field types are an open set: the built-in ones cover
//! scalars, dates, geometries, references to other models and nested
//! objects/lists, and more can be registered at startup.
//!
//! # Core Components
//!
//! - [`ValidationEngine`] - entry points: validate a definition, validate a record
//! - [`TypeRegistry`] - the registered field types
//! - [`FieldType`] - the contract a field type implements
//! - [`ModelStore`] - lookups the engine needs from the persistence layer
//!
//! # Quick Start
//!
//! ```rust
//! use dynamic_models::{InMemoryStorage, ValidationEngine};
//! use serde_json::json;
//!
//! let engine = ValidationEngine::new();
//! let store = InMemoryStorage::new();
//!
//! let definition = engine
//!     .validate_definition(
//!         &json!({
//!             "title": "Tree",
//!             "description": "City trees",
//!             "fields": [
//!                 {"name": "species", "type": "string"},
//!                 {"name": "location", "type": "point"}
//!             ]
//!         }),
//!         &store,
//!     )
//!     .unwrap();
//!
//! let errors = engine
//!     .validate_record(&definition, &json!({"location": "[200, 45]"}), &store)
//!     .unwrap_err();
//! assert_eq!(errors.fields(), vec!["species", "location"]);
//! ```

pub mod coercion;
pub mod engine;
pub mod error;
pub mod fields;
pub mod schema;
pub mod storage;

// Re-export commonly used types for convenience
pub use engine::{EngineConfig, ValidationEngine, ValidationEngineBuilder};
pub use error::{BuildError, FieldError, RegistryError, ValidationError, ValidationErrors};
pub use fields::{FieldType, FieldValidator, ValidationContext, ValueKind};
pub use schema::{
    CleanRecord, DefinitionValidator, FieldDeclaration, ModelDefinition, RecordValidator, Schema,
    TypeRegistry,
};
pub use storage::{InMemoryStorage, ModelStore, StorageError};
