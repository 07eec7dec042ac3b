//! Core data types for model definitions and records.
//!
//! A [`ModelDefinition`] is the schema a client submits at runtime; each of its
//! [`FieldDeclaration`]s names a registered field type and carries that type's
//! options. Records validated against a definition come out as a
//! [`CleanRecord`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record after validation: typed and coerced values, absent optional
/// fields omitted.
pub type CleanRecord = Map<String, Value>;

/// A runtime model definition.
///
/// Owned by the caller (typically a storage backend). The validation engine
/// only checks it and never persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Human-readable model title
    pub title: String,
    /// Model description
    pub description: String,
    /// Ordered list of field declarations
    pub fields: Vec<FieldDeclaration>,
    /// Extra top-level keys, preserved as sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelDefinition {
    /// Create an empty definition with the given title and description.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Append a field declaration.
    pub fn with_field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    /// Get a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Serialize back to the JSON shape clients send.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Declaration of one field inside a model definition.
///
/// The common envelope (`name`, `label`, `hint`, `required`, `type`) is typed;
/// everything else is kept in `options` and interpreted by the field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Field name, unique within a model. Empty for list `item` declarations.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Help text
    #[serde(default)]
    pub hint: String,
    /// Whether a value must be supplied
    #[serde(default = "default_required")]
    pub required: bool,
    /// Registered field type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Type-specific options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

fn default_required() -> bool {
    true
}

impl FieldDeclaration {
    /// Create a required declaration with no options.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            hint: String::new(),
            required: true,
            type_name: type_name.into(),
            options: Map::new(),
        }
    }

    /// Mark the field as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set a type-specific option.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Get a type-specific option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key).filter(|v| !v.is_null())
    }

    /// Get a string option.
    pub fn str_option(&self, key: &str) -> Option<&str> {
        self.option(key).and_then(Value::as_str)
    }

    /// Get a boolean option, falling back to `default` when absent.
    pub fn bool_option(&self, key: &str, default: bool) -> bool {
        self.option(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Name used when reporting errors about this declaration.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "item"
        } else {
            &self.name
        }
    }
}
