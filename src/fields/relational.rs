//! Relational field types.
//!
//! `oneof` and `anyof` reference records of another model. The model must
//! exist when the declaration is validated; record existence is checked at
//! value time through the [`ModelStore`](crate::storage::ModelStore), since
//! records are created after the schema.

use super::{FieldType, FieldValidator, ValidationContext, required_str_option};
use crate::coercion::{json_or_csv_list, value_type};
use crate::error::{BuildResult, ValidationError, ValidationResult};
use crate::schema::{FieldDeclaration, Schema, SchemaNode};
use crate::storage::ModelStore;
use log::warn;
use serde_json::{Map, Value};

fn relation_schema() -> Schema {
    Schema::envelope().key("model", SchemaNode::ExistingModel)
}

fn record_id(value: &Value) -> ValidationResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ValidationError::invalid_type("record id", value_type(other))),
    }
}

fn exists(store: &dyn ModelStore, model: &str, id: &str) -> ValidationResult<bool> {
    store.record_exists(model, id).map_err(|e| {
        warn!("Record lookup {}/{} failed: {}", model, id, e);
        ValidationError::Lookup {
            message: e.to_string(),
        }
    })
}

/// Reference to exactly one record of `model`
#[derive(Debug, Clone, Copy, Default)]
pub struct OneOfField;

impl FieldType for OneOfField {
    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        relation_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let model = required_str_option(declaration, "model")?.to_string();
        let store = ctx.store();

        Ok(FieldValidator::new(declaration, move |raw| {
            let id = record_id(raw)?;
            if !exists(store, &model, &id)? {
                return Err(ValidationError::RecordNotFound {
                    model: model.clone(),
                    id,
                });
            }
            Ok(Value::String(id))
        }))
    }
}

/// Reference to any number of records of `model`
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyOfField;

impl FieldType for AnyOfField {
    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        relation_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let model = required_str_option(declaration, "model")?.to_string();
        let store = ctx.store();

        Ok(FieldValidator::new(declaration, move |raw| {
            let ids = json_or_csv_list(raw)?
                .iter()
                .map(record_id)
                .collect::<ValidationResult<Vec<_>>>()?;

            let mut missing = Vec::new();
            for id in &ids {
                if !exists(store, &model, id)? {
                    missing.push(id.clone());
                }
            }
            if !missing.is_empty() {
                return Err(ValidationError::RecordsNotFound {
                    model: model.clone(),
                    ids: missing,
                });
            }
            Ok(Value::Array(ids.into_iter().map(Value::String).collect()))
        }))
    }
}
