//! Declarative schemas for field declarations.
//!
//! Each field type describes the shape its declaration must have as a
//! [`Schema`]: an ordered list of keys, each with a [`SchemaNode`] and a
//! [`Presence`], plus cross-key [`SchemaRule`]s. Validating a declaration
//! returns the normalized declaration (defaults filled in, values coerced,
//! unknown keys kept) or every problem found, addressed by path.

use super::validation::validate_declaration;
use crate::coercion::{decode_json, json_or_csv_list, value_type};
use crate::error::{FieldError, ValidationError};
use crate::fields::ValidationContext;
use crate::fields::scalar::{coerce_bool, coerce_float, coerce_int};
use log::warn;
use regex::Regex;
use serde_json::{Map, Value, json};
use std::collections::HashSet;

/// Path used for errors about the value as a whole.
pub const ROOT_PATH: &str = "$root";

/// How a schema key may be omitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    /// Must be supplied
    Required,
    /// May be omitted, and stays omitted
    Optional,
    /// May be omitted, and is filled with this value
    Default(Value),
}

/// Constraint applied to the value of one schema key.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A string, optionally required to hold non-whitespace text
    String { non_empty: bool },
    /// A field name matching the configured identifier pattern
    Identifier,
    /// Boolean, with the usual textual spellings
    Boolean,
    /// 64-bit integer
    Integer,
    /// Floating point number
    Number,
    /// One of a fixed set of strings
    OneOf(Vec<String>),
    /// Name of a registered field type
    TypeName,
    /// List of strings, JSON or comma separated
    StringList { min_len: usize },
    /// A regular expression that compiles
    Pattern,
    /// Name of a model known to the model store
    ExistingModel,
    /// A nested field declaration, one level deeper
    Declaration { named: bool },
    /// A list of nested field declarations, one level deeper
    DeclarationList { min_len: usize },
    /// The top-level field list of a model definition
    ModelFields { min_len: usize },
}

impl SchemaNode {
    /// Short name used in capability listings.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::String { .. } => "string",
            SchemaNode::Identifier => "identifier",
            SchemaNode::Boolean => "boolean",
            SchemaNode::Integer => "integer",
            SchemaNode::Number => "number",
            SchemaNode::OneOf(_) => "one_of",
            SchemaNode::TypeName => "type_name",
            SchemaNode::StringList { .. } => "string_list",
            SchemaNode::Pattern => "pattern",
            SchemaNode::ExistingModel => "model",
            SchemaNode::Declaration { .. } => "declaration",
            SchemaNode::DeclarationList { .. } | SchemaNode::ModelFields { .. } => {
                "declaration_list"
            }
        }
    }

    /// Validate and normalize a single value found at `path`.
    fn check(
        &self,
        value: &Value,
        path: &str,
        ctx: &ValidationContext<'_>,
    ) -> Result<Value, Vec<FieldError>> {
        let scalar = |result: Result<Value, ValidationError>| result.map_err(|e| vec![e.at(path)]);

        match self {
            SchemaNode::String { non_empty } => scalar(expect_str(value).and_then(|s| {
                if *non_empty && s.trim().is_empty() {
                    Err(ValidationError::custom("Must not be empty"))
                } else {
                    Ok(Value::String(s.to_string()))
                }
            })),
            SchemaNode::Identifier => scalar(expect_str(value).and_then(|s| {
                let pattern = ctx.field_name_pattern();
                if pattern.is_match(s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(ValidationError::custom(format!(
                        "Invalid field name '{}', must match {}",
                        s,
                        pattern.as_str()
                    )))
                }
            })),
            SchemaNode::Boolean => scalar(coerce_bool(value).map(Value::Bool)),
            SchemaNode::Integer => scalar(coerce_int(value).map(Value::from)),
            SchemaNode::Number => scalar(coerce_float(value).map(Value::from)),
            SchemaNode::OneOf(allowed) => scalar(expect_str(value).and_then(|s| {
                if allowed.iter().any(|a| a == s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(ValidationError::NotInChoices {
                        value: s.to_string(),
                        allowed: allowed.clone(),
                    })
                }
            })),
            SchemaNode::TypeName => scalar(expect_str(value).and_then(|s| {
                let registry = ctx.registry();
                if registry.contains(s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(ValidationError::NotInChoices {
                        value: s.to_string(),
                        allowed: registry.names(),
                    })
                }
            })),
            SchemaNode::StringList { min_len } => scalar(string_list(value, *min_len)),
            SchemaNode::Pattern => scalar(expect_str(value).and_then(|s| {
                anchored_pattern(s)
                    .map(|_| Value::String(s.to_string()))
                    .map_err(|e| {
                        ValidationError::custom(format!("Invalid regular expression: {}", e))
                    })
            })),
            SchemaNode::ExistingModel => scalar(expect_str(value).and_then(|model| {
                match ctx.store().get_model_definition(model) {
                    Ok(Some(_)) => Ok(Value::String(model.to_string())),
                    Ok(None) => Err(ValidationError::ModelNotFound {
                        model: model.to_string(),
                    }),
                    Err(e) => {
                        warn!("Model lookup for '{}' failed: {}", model, e);
                        Err(ValidationError::Lookup {
                            message: e.to_string(),
                        })
                    }
                }
            })),
            SchemaNode::Declaration { named } => {
                ctx.ensure_depth(path).map_err(|e| vec![e.at(path)])?;
                let decoded = scalar(decode_json(value))?;
                validate_declaration(&decoded, path, *named, &ctx.nested())
            }
            SchemaNode::DeclarationList { min_len } => {
                ctx.ensure_depth(path).map_err(|e| vec![e.at(path)])?;
                declaration_list(value, path, *min_len, &ctx.nested())
            }
            SchemaNode::ModelFields { min_len } => declaration_list(value, path, *min_len, ctx),
        }
    }
}

/// Compile `pattern` so that it must match a whole value.
///
/// The pattern is compiled on its own first: an unbalanced group such as
/// `a)|(b` only becomes valid once wrapped, and would then match unanchored.
pub fn anchored_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)?;
    Regex::new(&format!("^(?:{})$", pattern))
}

fn expect_str(value: &Value) -> Result<&str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::invalid_type("string", value_type(value)))
}

fn string_list(value: &Value, min_len: usize) -> Result<Value, ValidationError> {
    let items = json_or_csv_list(value)?;
    if let Some(bad) = items.iter().find(|item| !item.is_string()) {
        return Err(ValidationError::invalid_type("string", value_type(bad)));
    }
    if items.len() < min_len {
        return Err(ValidationError::TooShort { min: min_len });
    }
    if items.iter().any(|item| item.as_str().is_some_and(|s| s.trim().is_empty())) {
        return Err(ValidationError::custom("Must not contain blank entries"));
    }
    Ok(Value::Array(items))
}

/// Validate every declaration of a list, then check names are unique.
fn declaration_list(
    value: &Value,
    path: &str,
    min_len: usize,
    ctx: &ValidationContext<'_>,
) -> Result<Value, Vec<FieldError>> {
    let items = match decode_json(value) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            return Err(vec![
                ValidationError::invalid_type("array", value_type(&other)).at(path),
            ]);
        }
        Err(e) => return Err(vec![e.at(path)]),
    };
    if items.len() < min_len {
        return Err(vec![ValidationError::TooShort { min: min_len }.at(path)]);
    }

    let mut clean = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let item_path = join(path, &index.to_string());
        match validate_declaration(item, &item_path, true, ctx) {
            Ok(declaration) => clean.push(declaration),
            Err(item_errors) => errors.extend(item_errors),
        }

        // Duplicates are reported on the later occurrence
        if let Some(name) = item.get("name").and_then(Value::as_str) {
            if !seen.insert(name.to_string()) {
                errors.push(FieldError::new(
                    join(&item_path, "name"),
                    format!("Duplicate field name '{}'", name),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(Value::Array(clean))
    } else {
        Err(errors)
    }
}

/// Join a parent path and a key with a dot.
pub(crate) fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// One key of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaKey {
    pub name: String,
    pub node: SchemaNode,
    pub presence: Presence,
}

/// Constraints spanning several keys.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaRule {
    /// Exactly one of these keys must be supplied
    Exclusive(Vec<String>),
    /// When both are supplied, `low` must not exceed `high`
    Ordered { low: String, high: String },
}

/// Schema a field declaration must satisfy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    keys: Vec<SchemaKey>,
    rules: Vec<SchemaRule>,
}

impl Schema {
    /// An empty schema, accepting any object.
    pub fn new() -> Self {
        Self::default()
    }

    /// The envelope every field declaration carries:
    /// `name`, `label`, `hint`, `required` and `type`.
    pub fn envelope() -> Self {
        Self::new()
            .key("name", SchemaNode::Identifier)
            .with_default("label", SchemaNode::String { non_empty: false }, json!(""))
            .with_default("hint", SchemaNode::String { non_empty: false }, json!(""))
            .with_default("required", SchemaNode::Boolean, json!(true))
            .key("type", SchemaNode::TypeName)
    }

    fn push(mut self, name: &str, node: SchemaNode, presence: Presence) -> Self {
        self.keys.retain(|k| k.name != name);
        self.keys.push(SchemaKey {
            name: name.to_string(),
            node,
            presence,
        });
        self
    }

    /// Add a required key. Replaces any key of the same name.
    pub fn key(self, name: &str, node: SchemaNode) -> Self {
        self.push(name, node, Presence::Required)
    }

    /// Add an optional key.
    pub fn optional(self, name: &str, node: SchemaNode) -> Self {
        self.push(name, node, Presence::Optional)
    }

    /// Add an optional key filled with `default` when omitted.
    pub fn with_default(self, name: &str, node: SchemaNode, default: Value) -> Self {
        self.push(name, node, Presence::Default(default))
    }

    /// Add a cross-key rule.
    pub fn rule(mut self, rule: SchemaRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Make a required key optional.
    pub fn relax(mut self, name: &str) -> Self {
        for key in self.keys.iter_mut().filter(|k| k.name == name) {
            if key.presence == Presence::Required {
                key.presence = Presence::Optional;
            }
        }
        self
    }

    pub fn keys(&self) -> &[SchemaKey] {
        &self.keys
    }

    pub fn rules(&self) -> &[SchemaRule] {
        &self.rules
    }

    /// Get a key by name.
    pub fn get(&self, name: &str) -> Option<&SchemaKey> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// Describe the schema keys as JSON for discovery endpoints.
    pub fn to_json(&self) -> Value {
        let keys = self
            .keys
            .iter()
            .map(|key| {
                let mut entry = json!({
                    "name": key.name,
                    "kind": key.node.kind(),
                    "required": key.presence == Presence::Required,
                });
                if let Presence::Default(default) = &key.presence {
                    entry["default"] = default.clone();
                }
                if let SchemaNode::OneOf(allowed) = &key.node {
                    entry["allowed"] = json!(allowed);
                }
                entry
            })
            .collect::<Vec<_>>();
        Value::Array(keys)
    }

    /// Validate `raw` against this schema.
    ///
    /// `path` prefixes every reported field (empty at the top level). The
    /// output keeps keys the schema does not know about.
    pub fn validate(
        &self,
        raw: &Value,
        path: &str,
        ctx: &ValidationContext<'_>,
    ) -> Result<Map<String, Value>, Vec<FieldError>> {
        let Some(object) = raw.as_object() else {
            let at = if path.is_empty() { ROOT_PATH } else { path };
            return Err(vec![
                ValidationError::invalid_type("object", value_type(raw)).at(at),
            ]);
        };

        let mut clean = object.clone();
        let mut errors = Vec::new();

        for key in &self.keys {
            let key_path = join(path, &key.name);
            match clean.remove(&key.name).filter(|v| !v.is_null()) {
                Some(value) => match key.node.check(&value, &key_path, ctx) {
                    Ok(normalized) => {
                        clean.insert(key.name.clone(), normalized);
                    }
                    Err(key_errors) => errors.extend(key_errors),
                },
                None => match &key.presence {
                    Presence::Required => errors.push(ValidationError::Required.at(key_path)),
                    Presence::Optional => {}
                    Presence::Default(default) => {
                        clean.insert(key.name.clone(), default.clone());
                    }
                },
            }
        }

        for rule in &self.rules {
            if let Some(error) = check_rule(rule, object, &clean, path) {
                errors.push(error);
            }
        }

        if errors.is_empty() {
            Ok(clean)
        } else {
            Err(errors)
        }
    }
}

fn check_rule(
    rule: &SchemaRule,
    raw: &Map<String, Value>,
    clean: &Map<String, Value>,
    path: &str,
) -> Option<FieldError> {
    match rule {
        SchemaRule::Exclusive(names) => {
            let supplied = names
                .iter()
                .filter(|n| raw.get(n.as_str()).is_some_and(|v| !v.is_null()))
                .count();
            if supplied == 1 {
                return None;
            }
            let quoted = names
                .iter()
                .map(|n| format!("'{}'", n))
                .collect::<Vec<_>>()
                .join(", ");
            let at = match (path.is_empty(), names.first()) {
                (false, _) => path.to_string(),
                (true, Some(first)) => first.clone(),
                (true, None) => ROOT_PATH.to_string(),
            };
            Some(FieldError::new(at, format!("Exactly one of {} is required", quoted)))
        }
        SchemaRule::Ordered { low, high } => {
            let lo = clean.get(low).and_then(Value::as_f64)?;
            let hi = clean.get(high).and_then(Value::as_f64)?;
            (lo > hi).then(|| {
                FieldError::new(
                    join(path, low),
                    format!("'{}' must not be greater than '{}'", low, high),
                )
            })
        }
    }
}
