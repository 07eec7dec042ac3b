//! Error types for model definition and record validation.
//!
//! Three families of errors live here. [`RegistryError`] covers configuration
//! mistakes made while populating a [`TypeRegistry`](crate::schema::TypeRegistry).
//! [`ValidationError`] describes why a single value was rejected, and
//! [`BuildError`] describes why a field validator could not be constructed from
//! its declaration.
//!
//! None of these escape the top-level validators as errors of their own. They
//! are turned into [`FieldError`] values and collected into
//! [`ValidationErrors`], which is what callers serialize into a response body.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised while populating or querying the field type registry.
///
/// These are programming or configuration errors and are expected at startup
/// only, except for [`RegistryError::UnknownFieldType`] which a declaration can
/// trigger at request time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A type with this name was registered twice
    #[error("Field type '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Attempt to remove a type that was never registered
    #[error("Field type '{name}' is not registered")]
    NotRegistered { name: String },

    /// Lookup of a type name that is not in the registry
    #[error("Unknown field type '{name}'")]
    UnknownFieldType { name: String },
}

/// Reasons a single field value was rejected.
///
/// The `Display` output of each variant is the message reported to the client,
/// so the wording is kept short and free of the field name (the field is
/// attached separately by [`ValidationError::at`]).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// No value supplied for a required field
    #[error("Required")]
    Required,

    /// Value has the wrong JSON type
    #[error("Expected {expected}, got {actual}")]
    InvalidType { expected: String, actual: String },

    /// Value could not be read as a number
    #[error("\"{value}\" is not a number")]
    NotANumber { value: String },

    /// Value could not be read as a boolean
    #[error("\"{value}\" is neither true nor false")]
    NotABoolean { value: String },

    /// Value is not one of the declared choices
    #[error("\"{value}\" is not one of {}", .allowed.join(", "))]
    NotInChoices { value: String, allowed: Vec<String> },

    /// Integer outside the declared bounds
    #[error("{value} is out of range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },

    /// Sequence shorter than allowed
    #[error("Shorter than minimum length {min}")]
    TooShort { min: usize },

    /// String not matched by the declared pattern
    #[error("String does not match expected pattern '{pattern}'")]
    PatternMismatch { pattern: String },

    /// Malformed email address
    #[error("Invalid email address")]
    InvalidEmail,

    /// Malformed URL
    #[error("Must be a URL")]
    InvalidUrl,

    /// Value is not an ISO-8601 date
    #[error("Invalid date: \"{value}\"")]
    InvalidDate { value: String },

    /// Value is not an ISO-8601 date-time
    #[error("Invalid date-time: \"{value}\"")]
    InvalidDateTime { value: String },

    /// Transport encoding (JSON or CSV) could not be decoded
    #[error("Could not decode value: {details}")]
    Coercion { details: String },

    /// Coordinates or GeoJSON structure is malformed
    #[error("Invalid geometry: {details}")]
    InvalidGeometry { details: String },

    /// One or more list elements failed the item validator
    #[error("Invalid elements at positions {indices:?}")]
    InvalidElements { indices: Vec<usize> },

    /// Referenced model does not exist
    #[error("Model '{model}' not found")]
    ModelNotFound { model: String },

    /// Referenced record does not exist
    #[error("Record '{id}' not found in model '{model}'")]
    RecordNotFound { model: String, id: String },

    /// Some of the referenced records do not exist
    #[error("Records not found in model '{model}': {}", .ids.join(", "))]
    RecordsNotFound { model: String, ids: Vec<String> },

    /// The model store failed while resolving a reference
    #[error("Lookup failed: {message}")]
    Lookup { message: String },

    /// Errors collected from a nested record (object fields)
    #[error("{}", join_field_errors(.errors))]
    Nested { errors: Vec<FieldError> },

    /// General validation error with custom message
    #[error("{message}")]
    Custom { message: String },
}

/// Errors raised while constructing a field validator from its declaration.
///
/// Validator construction is fallible on purpose: an `object` field pointing
/// at a model that no longer exists fails here, when the referencing model is
/// built, instead of failing on the first record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Declared type is not registered
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Model referenced by the declaration does not exist
    #[error("Model '{model}' referenced by field '{field}' not found")]
    ModelNotFound { field: String, model: String },

    /// Declaration options are missing or malformed
    #[error("Invalid declaration for field '{field}': {message}")]
    InvalidDeclaration { field: String, message: String },

    /// Object/list declarations nest deeper than the configured limit
    #[error("Field '{field}' exceeds the maximum nesting depth of {max_depth}")]
    TooDeep { field: String, max_depth: usize },

    /// The model store failed while resolving a referenced model
    #[error("Storage error while building field '{field}': {message}")]
    Storage { field: String, message: String },

    /// Engine configuration is invalid
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

/// A single field-scoped error, the unit reported back to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name, or dotted path for nested fields
    pub field: String,
    /// Human readable reason
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Return a copy of this error with its field nested under `parent`.
    pub fn nested_under(&self, parent: &str) -> Self {
        let field = if self.field.is_empty() {
            parent.to_string()
        } else {
            format!("{}.{}", parent, self.field)
        };
        Self::new(field, self.message.clone())
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The error list produced when a definition or record is rejected.
///
/// The whole definition or record is rejected as a unit; this collects every
/// field-level problem found along the way. It serializes as a plain JSON
/// array of `{"field": ..., "message": ...}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Create an empty error list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Append an error built from a field name and a value error
    pub fn add(&mut self, field: impl Into<String>, error: &ValidationError) {
        match error {
            ValidationError::Nested { errors } => {
                let field = field.into();
                self.0.extend(errors.iter().map(|e| e.nested_under(&field)));
            }
            other => self.0.push(FieldError::new(field, other.to_string())),
        }
    }

    /// Whether no errors were collected
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of errors collected
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the collected errors
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// First error reported for `field`, if any
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Names of the fields that have errors, in report order
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    /// Consume into the underlying list
    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl Extend<FieldError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation error(s): {}",
            self.0.len(),
            join_field_errors(&self.0)
        )
    }
}

impl std::error::Error for ValidationErrors {}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// Convenience methods for creating common errors
impl ValidationError {
    /// Create an invalid type error
    pub fn invalid_type(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidType {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a coercion error
    pub fn coercion(details: impl Into<String>) -> Self {
        Self::Coercion {
            details: details.into(),
        }
    }

    /// Create an invalid geometry error
    pub fn geometry(details: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            details: details.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// Attach this error to a field.
    pub fn at(&self, field: impl Into<String>) -> FieldError {
        FieldError::new(field, self.to_string())
    }
}

impl BuildError {
    /// Create an invalid declaration error
    pub fn invalid_declaration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Attach this error to a field.
    pub fn at(&self, field: impl Into<String>) -> FieldError {
        FieldError::new(field, self.to_string())
    }
}

// Result type aliases for convenience
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type BuildResult<T> = Result<T, BuildError>;
