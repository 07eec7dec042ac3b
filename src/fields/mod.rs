//! Field types: the unit of extension of the validation engine.
//!
//! Every field type implements [`FieldType`], a two-method contract:
//!
//! - [`FieldType::definition`] returns the [`Schema`] a declaration of this
//!   type must satisfy (the common envelope plus type-specific keys)
//! - [`FieldType::validation`] turns an already validated declaration into a
//!   [`FieldValidator`], a function from a raw value to a clean value
//!
//! A type that overrides nothing behaves as a required string field carrying
//! the common envelope only. Most scalar types just override
//! [`FieldType::node`] to pick a different primitive coercion.
//!
//! # Writing a custom type
//!
//! ```rust
//! use dynamic_models::fields::{FieldType, FieldValidator, ValidationContext, ValueKind};
//! use dynamic_models::error::{BuildResult, ValidationError};
//! use dynamic_models::schema::FieldDeclaration;
//! use dynamic_models::TypeRegistry;
//! use serde_json::Value;
//!
//! struct EvenField;
//!
//! impl FieldType for EvenField {
//!     fn node(&self) -> ValueKind {
//!         ValueKind::Integer
//!     }
//!
//!     fn validation<'a>(
//!         &self,
//!         declaration: &FieldDeclaration,
//!         _ctx: ValidationContext<'a>,
//!     ) -> BuildResult<FieldValidator<'a>> {
//!         Ok(FieldValidator::for_kind(declaration, self.node()).and_then(|value| {
//!             match value.as_i64() {
//!                 Some(n) if n % 2 == 0 => Ok(value),
//!                 _ => Err(ValidationError::custom("Must be even")),
//!             }
//!         }))
//!     }
//! }
//!
//! let mut registry = TypeRegistry::with_builtin_types();
//! registry.register("even", EvenField).unwrap();
//! assert!(registry.contains("even"));
//! ```

pub mod composite;
pub mod geometry;
pub mod relational;
pub mod scalar;
pub mod temporal;

use crate::coercion::{self, decode_json_object, json_or_csv_list};
use crate::engine::{DEFAULT_FIELD_NAME, DEFAULT_MAX_DEPTH};
use crate::error::{BuildError, BuildResult, ValidationError, ValidationResult};
use crate::schema::{FieldDeclaration, Schema, TypeRegistry};
use crate::storage::ModelStore;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub use composite::{ListField, ObjectField};
pub use geometry::{GeoJsonField, LineField, PointField, PolygonField};
pub use relational::{AnyOfField, OneOfField};
pub use scalar::{
    BooleanField, ChoicesField, DecimalField, EmailField, EnumField, IntField, RangeField,
    RegexField, StringField, TextField, UrlField,
};
pub use temporal::{DateField, DateTimeField, auto_now};

/// The contract every field type implements.
///
/// Implementations must be stateless with respect to individual declarations:
/// all per-field configuration arrives through the declaration options.
pub trait FieldType: Send + Sync {
    /// Underlying primitive kind of the clean value.
    fn node(&self) -> ValueKind {
        ValueKind::String
    }

    /// Schema that validates a declaration of this type.
    ///
    /// `options` are the declaration as submitted, for types whose declaration
    /// schema depends on other keys.
    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope()
    }

    /// Build the value validator for a validated declaration.
    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        Ok(FieldValidator::for_kind(declaration, self.node()))
    }
}

/// Primitive kinds a clean value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text
    String,
    /// 64-bit signed integer
    Integer,
    /// Floating point number
    Decimal,
    /// true / false
    Boolean,
    /// ISO-8601 calendar date
    Date,
    /// ISO-8601 instant
    DateTime,
    /// List, decoded with the JSON-or-CSV fallback
    Sequence,
    /// JSON object, possibly JSON-encoded
    Mapping,
}

impl ValueKind {
    /// Coerce a raw value into this kind.
    pub fn coerce(self, raw: &Value) -> ValidationResult<Value> {
        match self {
            ValueKind::String => scalar::coerce_string(raw).map(Value::String),
            ValueKind::Integer => scalar::coerce_int(raw).map(Value::from),
            ValueKind::Decimal => scalar::coerce_float(raw).map(Value::from),
            ValueKind::Boolean => scalar::coerce_bool(raw).map(Value::Bool),
            ValueKind::Date => {
                temporal::parse_date(raw).map(|d| Value::String(temporal::format_date(d)))
            }
            ValueKind::DateTime => {
                temporal::parse_datetime(raw).map(|dt| Value::String(temporal::format_datetime(dt)))
            }
            ValueKind::Sequence => json_or_csv_list(raw).map(Value::Array),
            ValueKind::Mapping => decode_json_object(raw).map(Value::Object),
        }
    }

    /// Lower-case name used in listings and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Check<'a> = Box<dyn Fn(&Value) -> ValidationResult<Value> + Send + Sync + 'a>;
type MissingValue<'a> = Box<dyn Fn() -> Option<Value> + Send + Sync + 'a>;

/// Per-field value validator built from a declaration.
///
/// Built fresh for each validation call and owned by it. May borrow the
/// model store for relational checks, hence the lifetime.
pub struct FieldValidator<'a> {
    name: String,
    required: bool,
    missing: MissingValue<'a>,
    check: Check<'a>,
}

impl<'a> FieldValidator<'a> {
    /// Create a validator for `declaration` applying `check` to supplied values.
    pub fn new<F>(declaration: &FieldDeclaration, check: F) -> Self
    where
        F: Fn(&Value) -> ValidationResult<Value> + Send + Sync + 'a,
    {
        Self {
            name: declaration.name.clone(),
            required: declaration.required,
            missing: Box::new(|| None),
            check: Box::new(check),
        }
    }

    /// Create a validator applying the primitive coercion of `kind`.
    pub fn for_kind(declaration: &FieldDeclaration, kind: ValueKind) -> Self {
        Self::new(declaration, move |raw| kind.coerce(raw))
    }

    /// Chain a further check on the coerced value.
    pub fn and_then<F>(self, next: F) -> Self
    where
        F: Fn(Value) -> ValidationResult<Value> + Send + Sync + 'a,
    {
        let FieldValidator {
            name,
            required,
            missing,
            check,
        } = self;
        Self {
            name,
            required,
            missing,
            check: Box::new(move |raw| check(raw).and_then(&next)),
        }
    }

    /// Replace the value used when none is supplied.
    ///
    /// The producer runs at validation time, once per record.
    pub fn with_missing<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Option<Value> + Send + Sync + 'a,
    {
        self.missing = Box::new(producer);
        self
    }

    /// Field name this validator was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a value must be supplied.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Validate a raw value.
    ///
    /// A missing key, `null` and `""` all count as "no value". With no value
    /// an optional field yields `Ok(None)` (the missing sentinel) unless a
    /// default producer is set; a required one fails with
    /// [`ValidationError::Required`].
    pub fn validate(&self, raw: Option<&Value>) -> ValidationResult<Option<Value>> {
        match raw.filter(|v| !is_blank(v)) {
            Some(value) => (self.check)(value).map(Some),
            None => match (self.missing)() {
                Some(default) => Ok(Some(default)),
                None if self.required => Err(ValidationError::Required),
                None => Ok(None),
            },
        }
    }
}

impl fmt::Debug for FieldValidator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Everything a field type may consult while validating.
///
/// Cheap to copy. Carries the registry (for recursive declarations), the
/// model store collaborator, the configured limits and the current nesting
/// depth.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    registry: &'a TypeRegistry,
    store: &'a dyn ModelStore,
    field_name: &'a Regex,
    max_depth: usize,
    depth: usize,
}

impl<'a> ValidationContext<'a> {
    /// Create a context with the default limits.
    pub fn new(registry: &'a TypeRegistry, store: &'a dyn ModelStore) -> Self {
        Self {
            registry,
            store,
            field_name: &DEFAULT_FIELD_NAME,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    /// Override the field name pattern and maximum nesting depth.
    pub fn with_limits(mut self, field_name: &'a Regex, max_depth: usize) -> Self {
        self.field_name = field_name;
        self.max_depth = max_depth;
        self
    }

    /// The type registry.
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// The model store collaborator.
    pub fn store(&self) -> &'a dyn ModelStore {
        self.store
    }

    /// Pattern every declared field name must match.
    pub fn field_name_pattern(&self) -> &'a Regex {
        self.field_name
    }

    /// Maximum nesting depth of object/list declarations.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for one level deeper.
    pub fn nested(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Fail when building a nested validator would exceed the depth limit.
    pub fn ensure_depth(&self, field: &str) -> BuildResult<()> {
        if self.depth >= self.max_depth {
            return Err(BuildError::TooDeep {
                field: field.to_string(),
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("field_name", &self.field_name.as_str())
            .field("max_depth", &self.max_depth)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// Read a list-of-strings option from a declaration.
pub(crate) fn string_list_option(
    declaration: &FieldDeclaration,
    key: &str,
) -> BuildResult<Vec<String>> {
    let raw = declaration.option(key).ok_or_else(|| {
        BuildError::invalid_declaration(declaration.display_name(), format!("missing '{}'", key))
    })?;
    let items = json_or_csv_list(raw)
        .map_err(|e| BuildError::invalid_declaration(declaration.display_name(), e.to_string()))?;
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(BuildError::invalid_declaration(
                declaration.display_name(),
                format!(
                    "'{}' must contain strings, got {}",
                    key,
                    coercion::value_type(&other)
                ),
            )),
        })
        .collect()
}

/// Read a required string option from a declaration.
pub(crate) fn required_str_option<'d>(
    declaration: &'d FieldDeclaration,
    key: &str,
) -> BuildResult<&'d str> {
    declaration.str_option(key).ok_or_else(|| {
        BuildError::invalid_declaration(declaration.display_name(), format!("missing '{}'", key))
    })
}

/// The built-in field types, in registration order.
pub fn builtin_types() -> Vec<(&'static str, Arc<dyn FieldType>)> {
    fn entry(
        name: &'static str,
        field_type: impl FieldType + 'static,
    ) -> (&'static str, Arc<dyn FieldType>) {
        (name, Arc::new(field_type))
    }

    vec![
        entry("int", IntField),
        entry("string", StringField),
        entry("text", TextField),
        entry("decimal", DecimalField),
        entry("boolean", BooleanField),
        entry("enum", EnumField),
        entry("choices", ChoicesField),
        entry("range", RangeField),
        entry("regex", RegexField),
        entry("email", EmailField),
        entry("url", UrlField),
        entry("date", DateField),
        entry("datetime", DateTimeField),
        entry("point", PointField),
        entry("line", LineField),
        entry("polygon", PolygonField),
        entry("geojson", GeoJsonField),
        entry("oneof", OneOfField),
        entry("anyof", AnyOfField),
        entry("object", ObjectField),
        entry("list", ListField),
    ]
}
