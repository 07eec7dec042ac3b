//! Composite field types: `object` and `list`.
//!
//! Both embed further field declarations and build their validators through
//! the registry, one nesting level deeper. An `object` field reuses the fields
//! of an existing model or declares its own inline; a `list` field optionally
//! types its elements with a single unnamed `item` declaration.

use super::{FieldType, FieldValidator, ValidationContext, ValueKind};
use crate::coercion::{decode_json, decode_json_object, json_or_csv_list};
use crate::error::{BuildError, BuildResult, ValidationError};
use crate::schema::{FieldDeclaration, RecordValidator, Schema, SchemaNode, SchemaRule};
use log::{trace, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

fn declared<T: DeserializeOwned>(
    declaration: &FieldDeclaration,
    key: &str,
    raw: &Value,
) -> BuildResult<T> {
    decode_json(raw)
        .map_err(|e| e.to_string())
        .and_then(|decoded| serde_json::from_value(decoded).map_err(|e| e.to_string()))
        .map_err(|message| {
            BuildError::invalid_declaration(
                declaration.display_name(),
                format!("'{}': {}", key, message),
            )
        })
}

/// Resolve the field list of an object declaration.
fn object_fields(
    declaration: &FieldDeclaration,
    ctx: &ValidationContext<'_>,
) -> BuildResult<Vec<FieldDeclaration>> {
    let field = declaration.display_name();

    if let Some(model) = declaration.str_option("model") {
        return match ctx.store().get_model_definition(model) {
            Ok(Some(definition)) => Ok(definition.fields),
            Ok(None) => Err(BuildError::ModelNotFound {
                field: field.to_string(),
                model: model.to_string(),
            }),
            Err(e) => {
                warn!("Resolving model '{}' for field '{}' failed: {}", model, field, e);
                Err(BuildError::Storage {
                    field: field.to_string(),
                    message: e.to_string(),
                })
            }
        };
    }

    match declaration.option("fields") {
        Some(raw) => declared(declaration, "fields", raw),
        None => Err(BuildError::invalid_declaration(
            field,
            "one of 'model' or 'fields' is required",
        )),
    }
}

/// Nested record, typed by a model or an inline field list
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectField;

impl FieldType for ObjectField {
    fn node(&self) -> ValueKind {
        ValueKind::Mapping
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope()
            .optional("model", SchemaNode::ExistingModel)
            .optional("fields", SchemaNode::DeclarationList { min_len: 1 })
            .rule(SchemaRule::Exclusive(vec![
                "model".to_string(),
                "fields".to_string(),
            ]))
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        ctx.ensure_depth(declaration.display_name())?;
        let fields = object_fields(declaration, &ctx)?;
        trace!(
            "Building object field '{}' with {} nested fields at depth {}",
            declaration.display_name(),
            fields.len(),
            ctx.depth() + 1
        );
        let nested = RecordValidator::new(&fields, ctx.nested())?;

        Ok(FieldValidator::new(declaration, move |raw| {
            let object = decode_json_object(raw)?;
            nested
                .validate_object(&object)
                .map(Value::Object)
                .map_err(|errors| ValidationError::Nested {
                    errors: errors.into_inner(),
                })
        }))
    }
}

/// Sequence of values, optionally typed by an `item` declaration
#[derive(Debug, Clone, Copy, Default)]
pub struct ListField;

impl FieldType for ListField {
    fn node(&self) -> ValueKind {
        ValueKind::Sequence
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope().optional("item", SchemaNode::Declaration { named: false })
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let item = match declaration.option("item") {
            Some(raw) => {
                ctx.ensure_depth(declaration.display_name())?;
                let item: FieldDeclaration = declared(declaration, "item", raw)?;
                Some(ctx.registry().validator(&item, ctx.nested())?)
            }
            None => None,
        };

        Ok(FieldValidator::new(declaration, move |raw| {
            let elements = json_or_csv_list(raw)?;
            let Some(item) = &item else {
                return Ok(Value::Array(elements));
            };

            let mut clean = Vec::with_capacity(elements.len());
            let mut invalid = Vec::new();
            for (index, element) in elements.iter().enumerate() {
                match item.validate(Some(element)) {
                    Ok(value) => clean.push(value.unwrap_or(Value::Null)),
                    Err(_) => invalid.push(index),
                }
            }
            if !invalid.is_empty() {
                return Err(ValidationError::InvalidElements { indices: invalid });
            }
            Ok(Value::Array(clean))
        }))
    }
}
