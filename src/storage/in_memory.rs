//! In-memory model store.
//!
//! A thread-safe reference implementation of [`ModelStore`] using `HashMap`s
//! behind a `RwLock`. Used by tests, benchmarks and the
//! `definition-validator` binary; also suitable for development.
//!
//! # Performance Characteristics
//!
//! * model and record lookups: O(1) average case
//! * `delete_model`: O(n) in the number of stored records
//! * `stats`: O(1)

use super::{ModelStore, StorageError, StorageKey};
use crate::schema::ModelDefinition;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    models: HashMap<String, ModelDefinition>,
    records: HashMap<StorageKey, Value>,
}

/// Thread-safe in-memory model store.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

/// Counters reported by [`InMemoryStorage::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InMemoryStorageStats {
    pub model_count: usize,
    pub record_count: usize,
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::internal("storage lock poisoned")
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a model definition, replacing any previous one.
    pub fn put_model(
        &self,
        name: impl Into<String>,
        definition: ModelDefinition,
    ) -> Result<(), StorageError> {
        let name = name.into();
        let mut inner = self.inner.write().map_err(poisoned)?;
        debug!("Storing model '{}' with {} fields", name, definition.fields.len());
        inner.models.insert(name, definition);
        Ok(())
    }

    /// Remove a model and all of its records. Returns whether it existed.
    pub fn delete_model(&self, name: &str) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let existed = inner.models.remove(name).is_some();
        inner.records.retain(|key, _| key.model() != name);
        if existed {
            debug!("Deleted model '{}'", name);
        }
        Ok(existed)
    }

    /// Names of the stored models, sorted.
    pub fn model_names(&self) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let mut names: Vec<String> = inner.models.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Store a record under a fresh UUID, returning the ID.
    pub fn create_record(&self, model: &str, record: Value) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        self.put_record(model, &id, record)?;
        Ok(id)
    }

    /// Store a record under `id`, replacing any previous one.
    ///
    /// Fails with [`StorageError::ModelNotFound`] when the model is unknown.
    pub fn put_record(&self, model: &str, id: &str, record: Value) -> Result<Value, StorageError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if !inner.models.contains_key(model) {
            return Err(StorageError::model_not_found(model));
        }
        inner.records.insert(StorageKey::new(model, id), record.clone());
        Ok(record)
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete_record(&self, model: &str, id: &str) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.records.remove(&StorageKey::new(model, id)).is_some())
    }

    /// Get storage statistics for debugging and monitoring.
    pub fn stats(&self) -> Result<InMemoryStorageStats, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(InMemoryStorageStats {
            model_count: inner.models.len(),
            record_count: inner.records.len(),
        })
    }

    /// Clear all data (useful for testing).
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.models.clear();
        inner.records.clear();
        Ok(())
    }
}

impl ModelStore for InMemoryStorage {
    fn get_model_definition(&self, name: &str) -> Result<Option<ModelDefinition>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.models.get(name).cloned())
    }

    fn get_record(&self, model: &str, id: &str) -> Result<Option<Value>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.get(&StorageKey::new(model, id)).cloned())
    }

    fn record_exists(&self, model: &str, id: &str) -> Result<bool, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.contains_key(&StorageKey::new(model, id)))
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("InMemoryStorage");
        if let Ok(stats) = self.stats() {
            debug.field("models", &stats.model_count).field("records", &stats.record_count);
        }
        debug.finish()
    }
}
