//! Scalar field types.
//!
//! Leaf types with no sub-schema. Plain kinds (`int`, `string`, `text`,
//! `decimal`, `boolean`) differ only by their primitive coercion; the others
//! add declaration keys (`choices`, `min`/`max`, `regex`) or a fixed grammar
//! (`email`, `url`).

use super::{FieldType, FieldValidator, ValidationContext, ValueKind, string_list_option};
use crate::coercion::{json_or_csv_list, value_type};
use crate::error::{BuildError, BuildResult, ValidationError, ValidationResult};
use crate::schema::{FieldDeclaration, Schema, SchemaNode, SchemaRule, anchored_pattern};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%!#$&'*+\-/=?^_`{|}~()]+@[A-Z0-9]+([.\-][A-Z0-9]+)*\.[A-Z]{2,22}$")
        .expect("email pattern is valid")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:https?|ftp)://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}|",
        r"\[?[A-F0-9]*:[A-F0-9:]+\]?)",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$"
    ))
    .expect("url pattern is valid")
});

/// Coerce to a string. Numbers and booleans are rendered as text.
pub(crate) fn coerce_string(raw: &Value) -> ValidationResult<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ValidationError::invalid_type("string", value_type(other))),
    }
}

/// Coerce to an integer, accepting numeric strings.
pub(crate) fn coerce_int(raw: &Value) -> ValidationResult<i64> {
    match raw {
        Value::Number(n) => n.as_i64().ok_or_else(|| ValidationError::NotANumber {
            value: n.to_string(),
        }),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| ValidationError::NotANumber {
            value: s.clone(),
        }),
        other => Err(ValidationError::invalid_type("integer", value_type(other))),
    }
}

/// Coerce to a finite float, accepting numeric strings.
pub(crate) fn coerce_float(raw: &Value) -> ValidationResult<f64> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => return Err(ValidationError::invalid_type("number", value_type(other))),
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            value: match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
}

/// Coerce to a boolean from booleans, 0/1 or the usual textual spellings.
pub(crate) fn coerce_bool(raw: &Value) -> ValidationResult<bool> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(ValidationError::NotABoolean {
                value: n.to_string(),
            }),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ValidationError::NotABoolean { value: s.clone() }),
        },
        other => Err(ValidationError::invalid_type("boolean", value_type(other))),
    }
}

/// Integer field
#[derive(Debug, Clone, Copy, Default)]
pub struct IntField;

impl FieldType for IntField {
    fn node(&self) -> ValueKind {
        ValueKind::Integer
    }
}

/// Short string field
#[derive(Debug, Clone, Copy, Default)]
pub struct StringField;

impl FieldType for StringField {}

/// Long text field
#[derive(Debug, Clone, Copy, Default)]
pub struct TextField;

impl FieldType for TextField {}

/// Decimal number field
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalField;

impl FieldType for DecimalField {
    fn node(&self) -> ValueKind {
        ValueKind::Decimal
    }
}

/// Boolean field
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanField;

impl FieldType for BooleanField {
    fn node(&self) -> ValueKind {
        ValueKind::Boolean
    }
}

/// Single-select field: the value must equal one of `choices`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumField;

impl FieldType for EnumField {
    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope().key("choices", SchemaNode::StringList { min_len: 1 })
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let choices = string_list_option(declaration, "choices")?;
        Ok(
            FieldValidator::for_kind(declaration, self.node()).and_then(move |value| {
                match value.as_str() {
                    Some(s) if choices.iter().any(|c| c == s) => Ok(value),
                    _ => Err(ValidationError::NotInChoices {
                        value: value.as_str().map(str::to_string).unwrap_or_default(),
                        allowed: choices.clone(),
                    }),
                }
            }),
        )
    }
}

/// Multi-select field: every element of the decoded list must be in `choices`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoicesField;

impl FieldType for ChoicesField {
    fn node(&self) -> ValueKind {
        ValueKind::Sequence
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope().key("choices", SchemaNode::StringList { min_len: 1 })
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let choices = string_list_option(declaration, "choices")?;
        Ok(FieldValidator::new(declaration, move |raw| {
            let selected = json_or_csv_list(raw)?;
            for item in &selected {
                let known = item
                    .as_str()
                    .is_some_and(|s| choices.iter().any(|c| c == s));
                if !known {
                    return Err(ValidationError::NotInChoices {
                        value: match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        },
                        allowed: choices.clone(),
                    });
                }
            }
            Ok(Value::Array(selected))
        }))
    }
}

/// Bounded integer field, inclusive on both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeField;

impl FieldType for RangeField {
    fn node(&self) -> ValueKind {
        ValueKind::Integer
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope()
            .key("min", SchemaNode::Integer)
            .key("max", SchemaNode::Integer)
            .rule(SchemaRule::Ordered {
                low: "min".to_string(),
                high: "max".to_string(),
            })
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let bound = |key: &str| -> BuildResult<i64> {
            declaration
                .option(key)
                .ok_or_else(|| {
                    BuildError::invalid_declaration(
                        declaration.display_name(),
                        format!("missing '{}'", key),
                    )
                })
                .and_then(|v| {
                    coerce_int(v).map_err(|e| {
                        BuildError::invalid_declaration(
                            declaration.display_name(),
                            format!("'{}': {}", key, e),
                        )
                    })
                })
        };
        let (min, max) = (bound("min")?, bound("max")?);

        Ok(FieldValidator::new(declaration, move |raw| {
            let value = coerce_int(raw)?;
            if value < min || value > max {
                return Err(ValidationError::OutOfRange { value, min, max });
            }
            Ok(Value::from(value))
        }))
    }
}

/// String field constrained by a declared pattern, matched in full.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexField;

impl FieldType for RegexField {
    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope().key("regex", SchemaNode::Pattern)
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let pattern = super::required_str_option(declaration, "regex")?.to_string();
        let compiled = anchored_pattern(&pattern).map_err(|e| {
            BuildError::invalid_declaration(
                declaration.display_name(),
                format!("invalid regex: {}", e),
            )
        })?;

        Ok(FieldValidator::new(declaration, move |raw| {
            let value = coerce_string(raw)?;
            if !compiled.is_match(&value) {
                return Err(ValidationError::PatternMismatch {
                    pattern: pattern.clone(),
                });
            }
            Ok(Value::String(value))
        }))
    }
}

/// Email address field
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailField;

impl FieldType for EmailField {
    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        Ok(FieldValidator::new(declaration, |raw| {
            let value = coerce_string(raw)?;
            if !EMAIL_RE.is_match(&value) {
                return Err(ValidationError::InvalidEmail);
            }
            Ok(Value::String(value))
        }))
    }
}

/// URL field (http, https, ftp)
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlField;

impl FieldType for UrlField {
    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        Ok(FieldValidator::new(declaration, |raw| {
            let value = coerce_string(raw)?;
            if !URL_RE.is_match(&value) {
                return Err(ValidationError::InvalidUrl);
            }
            Ok(Value::String(value))
        }))
    }
}
