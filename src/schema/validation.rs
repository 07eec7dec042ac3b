//! Definition and record validation.
//!
//! [`DefinitionValidator`] checks a proposed model definition against the
//! meta-schema assembled from the registry. [`RecordValidator`] builds one
//! [`FieldValidator`] per declaration of a definition and applies them to an
//! incoming record, collecting every field error instead of stopping at the
//! first.

use super::definition::{ROOT_PATH, Schema, SchemaNode};
use super::types::{CleanRecord, FieldDeclaration, ModelDefinition};
use crate::coercion::value_type;
use crate::error::{BuildResult, FieldError, ValidationError, ValidationErrors};
use crate::fields::{FieldValidator, ValidationContext};
use log::{debug, trace};
use serde_json::{Map, Value};

/// Validate a single field declaration found at `path`.
///
/// The declared type picks the schema; an unknown or missing type falls back
/// to the common envelope, which then reports the bad `type`. Unnamed
/// declarations (list items) may omit `name`.
pub(crate) fn validate_declaration(
    raw: &Value,
    path: &str,
    named: bool,
    ctx: &ValidationContext<'_>,
) -> Result<Value, Vec<FieldError>> {
    let Some(options) = raw.as_object() else {
        let at = if path.is_empty() { ROOT_PATH } else { path };
        return Err(vec![
            ValidationError::invalid_type("object", value_type(raw)).at(at),
        ]);
    };

    let schema = options
        .get("type")
        .and_then(Value::as_str)
        .and_then(|name| ctx.registry().definition_schema(name, options).ok())
        .unwrap_or_else(Schema::envelope);
    let schema = if named { schema } else { schema.relax("name") };

    schema.validate(raw, path, ctx).map(Value::Object)
}

/// The schema of a model definition itself.
fn meta_schema() -> Schema {
    Schema::new()
        .key("title", SchemaNode::String { non_empty: true })
        .key("description", SchemaNode::String { non_empty: true })
        .key("fields", SchemaNode::ModelFields { min_len: 1 })
}

/// Validates proposed model definitions.
#[derive(Debug, Clone, Copy)]
pub struct DefinitionValidator<'a> {
    ctx: ValidationContext<'a>,
}

impl<'a> DefinitionValidator<'a> {
    pub fn new(ctx: ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    /// Validate a raw definition.
    ///
    /// Returns the normalized definition (envelope defaults filled in, values
    /// coerced) or every problem found, addressed by path (`fields.1.name`).
    pub fn validate(&self, raw: &Value) -> Result<ModelDefinition, ValidationErrors> {
        let clean = meta_schema()
            .validate(raw, "", &self.ctx)
            .map_err(|errors| {
                debug!("Rejected model definition with {} error(s)", errors.len());
                ValidationErrors::from(errors)
            })?;

        serde_json::from_value(Value::Object(clean))
            .map_err(|e| ValidationErrors::from(vec![FieldError::new(ROOT_PATH, e.to_string())]))
    }
}

/// Per-definition validator chain.
///
/// Built fresh for each validation; holds one [`FieldValidator`] per field,
/// in declaration order.
#[derive(Debug)]
pub struct RecordValidator<'a> {
    validators: Vec<FieldValidator<'a>>,
}

impl<'a> RecordValidator<'a> {
    /// Build validators for `fields`, failing on the first field that cannot
    /// be built.
    pub fn new(fields: &[FieldDeclaration], ctx: ValidationContext<'a>) -> BuildResult<Self> {
        let validators = fields
            .iter()
            .map(|field| ctx.registry().validator(field, ctx))
            .collect::<BuildResult<Vec<_>>>()?;
        trace!("Built record validator with {} fields", validators.len());
        Ok(Self { validators })
    }

    /// Build validators for every field that can be built, reporting the
    /// others as field errors.
    pub(crate) fn lenient(
        fields: &[FieldDeclaration],
        ctx: ValidationContext<'a>,
    ) -> (Self, ValidationErrors) {
        let mut validators = Vec::with_capacity(fields.len());
        let mut errors = ValidationErrors::new();
        for field in fields {
            match ctx.registry().validator(field, ctx) {
                Ok(validator) => validators.push(validator),
                Err(e) => errors.push(e.at(field.display_name())),
            }
        }
        (Self { validators }, errors)
    }

    /// Number of field validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Validate a raw record.
    pub fn validate(&self, raw: &Value) -> Result<CleanRecord, ValidationErrors> {
        match raw.as_object() {
            Some(object) => self.validate_object(object),
            None => Err(ValidationErrors::from(vec![
                ValidationError::invalid_type("object", value_type(raw)).at(ROOT_PATH),
            ])),
        }
    }

    /// Validate a record already decoded into an object.
    ///
    /// Keys without a declaration are ignored; optional fields left blank are
    /// omitted from the clean record.
    pub fn validate_object(
        &self,
        object: &Map<String, Value>,
    ) -> Result<CleanRecord, ValidationErrors> {
        self.collect(object, ValidationErrors::new())
    }

    fn collect(
        &self,
        object: &Map<String, Value>,
        mut errors: ValidationErrors,
    ) -> Result<CleanRecord, ValidationErrors> {
        let mut clean = CleanRecord::new();
        for validator in &self.validators {
            match validator.validate(object.get(validator.name())) {
                Ok(Some(value)) => {
                    clean.insert(validator.name().to_string(), value);
                }
                Ok(None) => {}
                Err(e) => errors.add(validator.name(), &e),
            }
        }
        errors.into_result(clean)
    }

    /// Validate a record, prepending errors found while building validators.
    pub(crate) fn validate_with(
        &self,
        raw: &Value,
        build_errors: ValidationErrors,
    ) -> Result<CleanRecord, ValidationErrors> {
        match raw.as_object() {
            Some(object) => self.collect(object, build_errors),
            None => {
                let mut errors = build_errors;
                errors.push(ValidationError::invalid_type("object", value_type(raw)).at(ROOT_PATH));
                Err(errors)
            }
        }
    }
}
