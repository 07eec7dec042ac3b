//! Common test utilities for model definition and record validation.
//!
//! This module provides assertion macros, builders and a few helpers shared
//! by the validation and integration suites.

use dynamic_models::{InMemoryStorage, ModelDefinition, ValidationEngine, ValidationErrors};
use serde_json::Value;


/// Assert that a validation result failed on exactly these fields, in order.
#[macro_export]
macro_rules! assert_error_fields {
    ($result:expr, [$($field:expr),* $(,)?]) => {
        match $result {
            Err(errors) => {
                let expected: Vec<&str> = vec![$($field),*];
                assert_eq!(errors.fields(), expected, "unexpected error fields: {}", errors);
            }
            Ok(value) => panic!(
                "Expected errors on {:?}, but validation passed with {:?}",
                vec![$($field),*] as Vec<&str>,
                value
            ),
        }
    };
}

/// Assert that the error reported for `field` mentions `substring`.
#[macro_export]
macro_rules! assert_field_message_contains {
    ($result:expr, $field:expr, $substring:expr) => {
        match $result {
            Err(errors) => {
                let error = errors
                    .field($field)
                    .unwrap_or_else(|| panic!("No error reported for '{}': {}", $field, errors));
                assert!(
                    error.message.contains($substring),
                    "Error message '{}' does not contain '{}'",
                    error.message,
                    $substring
                );
            }
            Ok(_) => panic!(
                "Expected an error on '{}' containing '{}', but validation passed",
                $field, $substring
            ),
        }
    };
}

/// Assert success and return the value.
#[macro_export]
macro_rules! assert_validation_success {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => panic!("Expected validation to succeed, but got error: {}", err),
        }
    };
}

/// Engine with built-in types plus an empty store.
pub fn setup() -> (ValidationEngine, InMemoryStorage) {
    init_logging();
    (ValidationEngine::new(), InMemoryStorage::new())
}

/// Install a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Validate a definition that the test expects to be valid.
pub fn define(engine: &ValidationEngine, store: &InMemoryStorage, raw: &Value) -> ModelDefinition {
    match engine.validate_definition(raw, store) {
        Ok(definition) => definition,
        Err(errors) => panic!("definition should be valid: {}", errors),
    }
}

/// Validate and store a definition under `name`.
pub fn define_and_store(
    engine: &ValidationEngine,
    store: &InMemoryStorage,
    name: &str,
    raw: &Value,
) -> ModelDefinition {
    let definition = define(engine, store, raw);
    store
        .put_model(name, definition.clone())
        .expect("store should accept the model");
    definition
}

/// Validate a single value against a one-field model built from `declaration`.
pub fn validate_value(
    engine: &ValidationEngine,
    store: &InMemoryStorage,
    declaration: Value,
    value: Value,
) -> Result<Value, ValidationErrors> {
    let raw = builders::DefinitionBuilder::new("T").field(declaration).build();
    let definition = define(engine, store, &raw);
    let name = definition.fields[0].name.clone();
    let mut record = serde_json::Map::new();
    record.insert(name.clone(), value);
    engine
        .validate_record(&definition, &Value::Object(record), store)
        .map(|mut clean| clean.remove(&name).unwrap_or(Value::Null))
}
