//! Model store collaborator.
//!
//! The validation engine does not persist anything. It consults a
//! [`ModelStore`] for two lookups only:
//!
//! - model-by-name, when a declaration references another model (`object`
//!   with `model`, `oneof`, `anyof`)
//! - record-by-id, when a relational value is validated
//!
//! `Ok(None)` means "not found" and is reported as a field error;
//! `Err(StorageError)` means the backend failed and is reported as a lookup
//! error. Lookups may be stale between declaration and value validation; the
//! engine gives no transactional guarantee across the two.
//!
//! # Example Usage
//!
//! ```rust
//! use dynamic_models::storage::{InMemoryStorage, ModelStore};
//! use dynamic_models::{FieldDeclaration, ModelDefinition};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//! storage.put_model(
//!     "tree",
//!     ModelDefinition::new("Tree", "City trees")
//!         .with_field(FieldDeclaration::new("species", "string")),
//! )?;
//!
//! let id = storage.create_record("tree", json!({"species": "oak"}))?;
//! assert!(storage.record_exists("tree", &id)?);
//! assert!(storage.get_model_definition("tree")?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StorageError;
pub use in_memory::{InMemoryStorage, InMemoryStorageStats};

use crate::schema::ModelDefinition;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Key of a stored record: `model` → `record_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    model: String,
    record_id: String,
}

impl StorageKey {
    /// Create a new storage key.
    pub fn new(model: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            record_id: record_id.into(),
        }
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the record ID.
    pub fn record_id(&self) -> &str {
        &self.record_id
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.model, self.record_id)
    }
}

/// Lookups the validation engine needs from the persistence layer.
///
/// Implementations are shared across concurrent validations and must be
/// thread safe. Calls block the validating thread.
pub trait ModelStore: Send + Sync {
    /// Get a model definition by name.
    fn get_model_definition(&self, name: &str) -> Result<Option<ModelDefinition>, StorageError>;

    /// Get a record of `model` by ID.
    fn get_record(&self, model: &str, id: &str) -> Result<Option<Value>, StorageError>;

    /// Check whether a record exists.
    fn record_exists(&self, model: &str, id: &str) -> Result<bool, StorageError> {
        Ok(self.get_record(model, id)?.is_some())
    }
}

impl<S: ModelStore + ?Sized> ModelStore for Arc<S> {
    fn get_model_definition(&self, name: &str) -> Result<Option<ModelDefinition>, StorageError> {
        (**self).get_model_definition(name)
    }

    fn get_record(&self, model: &str, id: &str) -> Result<Option<Value>, StorageError> {
        (**self).get_record(model, id)
    }

    fn record_exists(&self, model: &str, id: &str) -> Result<bool, StorageError> {
        (**self).record_exists(model, id)
    }
}
