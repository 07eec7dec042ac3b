//! End-to-end scenarios.
//!
//! A city catalogue: species and addresses are defined first, trees reference
//! both. Definitions and records go through the engine and into the
//! in-memory store, the way an API handler would drive them.

use crate::common::builders::{DefinitionBuilder, FieldBuilder};
use crate::common::{define, define_and_store, fixtures::catalogue, setup, validate_value};
use dynamic_models::error::{BuildResult, ValidationError};
use dynamic_models::fields::{FieldType, FieldValidator, ValidationContext, ValueKind};
use dynamic_models::schema::{FieldDeclaration, Schema, SchemaNode};
use dynamic_models::{BuildError, InMemoryStorage, ModelStore, ValidationEngine};
use serde_json::{Map, Value, json};

/// Store species and address, and one species record; returns its ID
fn seed_catalogue(engine: &ValidationEngine, store: &InMemoryStorage) -> String {
    define_and_store(engine, store, "species", &catalogue::species());
    define_and_store(engine, store, "address", &catalogue::address());

    let species = store
        .get_model_definition("species")
        .unwrap()
        .expect("species is stored");
    let clean = engine
        .validate_record(
            &species,
            &json!({"latin": "Platanus x hispanica", "common": "London plane", "evergreen": "no"}),
            store,
        )
        .expect("species record is valid");
    store
        .create_record("species", Value::Object(clean))
        .expect("species model exists")
}

/// Test the full flow from definitions to a stored record
#[test]
fn test_catalogue_flow() {
    let (engine, store) = setup();
    let plane = seed_catalogue(&engine, &store);
    let tree = define_and_store(&engine, &store, "tree", &catalogue::tree());

    let clean = assert_validation_success!(engine.validate_record(
        &tree,
        &catalogue::tree_record(&plane),
        &store
    ));

    assert_eq!(clean["species"], json!(plane));
    assert_eq!(clean["height"], json!(12.5));
    assert_eq!(clean["planted"], json!("2019-03-21"));
    assert!(clean["inspected"].as_str().is_some_and(|s| s.ends_with('Z')));
    assert_eq!(clean["condition"], json!("good"));
    assert_eq!(clean["features"], json!(["flowering", "protected"]));
    assert_eq!(clean["location"], json!([4.8357, 45.764]));
    assert_eq!(
        clean["caretaker"],
        json!({"street": "1 place Bellecour", "city": "Lyon", "zip": "69002"})
    );
    assert_eq!(clean["measures"], json!([11.0, 12.1, 12.5]));
    assert!(!clean.contains_key("notes"));
    assert!(!clean.contains_key("unknown"));

    let id = store.create_record("tree", Value::Object(clean)).unwrap();
    assert!(store.record_exists("tree", &id).unwrap());
    assert_eq!(store.stats().unwrap().record_count, 2);
}

/// Test every field error of a bad record is reported, in declaration order
#[test]
fn test_bad_record_reports_every_field() {
    let (engine, store) = setup();
    seed_catalogue(&engine, &store);
    let tree = define(&engine, &store, &catalogue::tree());

    let result = engine.validate_record(
        &tree,
        &json!({
            "species": "missing",
            "height": "tall",
            "condition": "dead",
            "location": [0, 95],
            "caretaker": {"city": "Lyon"}
        }),
        &store,
    );

    assert_error_fields!(
        result.clone(),
        [
            "species",
            "height",
            "planted",
            "condition",
            "location",
            "caretaker.street",
            "caretaker.zip"
        ]
    );

    let body = serde_json::to_value(result.unwrap_err()).unwrap();
    assert_eq!(body[2], json!({"field": "planted", "message": "Required"}));
}

/// Test a definition that references models missing from the store
#[test]
fn test_tree_needs_its_references() {
    let (engine, store) = setup();

    assert_error_fields!(
        engine.validate_definition(&catalogue::tree(), &store),
        ["fields.0.model", "fields.7.model"]
    );
}

/// Test a non-object record is rejected at the root
#[test]
fn test_non_object_record() {
    let (engine, store) = setup();
    let definition = define(&engine, &store, &catalogue::minimal());

    assert_error_fields!(
        engine.validate_record(&definition, &json!("age=3"), &store),
        ["$root"]
    );
}

/// Test a validator built once is reused across records
#[test]
fn test_record_validator_reuse() {
    let (engine, store) = setup();
    seed_catalogue(&engine, &store);
    let person = define(
        &engine,
        &store,
        &DefinitionBuilder::new("Person")
            .field(FieldBuilder::new("name", "string"))
            .field(FieldBuilder::new("home", "object").option("model", json!("address")))
            .build(),
    );

    let validator = engine.record_validator(&person, &store).expect("address exists");
    assert_eq!(validator.len(), 2);

    let home = json!({"street": "s", "city": "c", "zip": "00001"});
    for name in ["Ada", "Grace", "Edsger"] {
        let clean =
            assert_validation_success!(validator.validate(&json!({"name": name, "home": home})));
        assert_eq!(clean["name"], json!(name));
    }

    store.delete_model("address").unwrap();
    assert!(matches!(
        engine.record_validator(&person, &store),
        Err(BuildError::ModelNotFound { model, .. }) if model == "address"
    ));
}

/// Field type accepting lower-case slugs up to `max_length` characters
struct SlugField;

impl FieldType for SlugField {
    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        Schema::envelope().with_default("max_length", SchemaNode::Integer, json!(32))
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let max_length = declaration
            .option("max_length")
            .and_then(Value::as_u64)
            .unwrap_or(32) as usize;

        Ok(
            FieldValidator::for_kind(declaration, ValueKind::String).and_then(move |value| {
                let slug = value.as_str().unwrap_or_default();
                if slug.len() > max_length {
                    return Err(ValidationError::custom(format!(
                        "Longer than {} characters",
                        max_length
                    )));
                }
                if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
                    return Err(ValidationError::custom("Must be a lower-case slug"));
                }
                Ok(value)
            }),
        )
    }
}

/// Test a custom field type registered at startup
#[test]
fn test_custom_field_type() {
    crate::common::init_logging();
    let engine = ValidationEngine::builder()
        .with_builtin_types()
        .register_type("slug", SlugField)
        .build()
        .unwrap();
    let store = InMemoryStorage::new();

    let article = define(
        &engine,
        &store,
        &DefinitionBuilder::new("Article")
            .field(FieldBuilder::new("slug", "slug").option("max_length", json!("10")))
            .build(),
    );
    assert_eq!(article.fields[0].option("max_length"), Some(&json!(10)));

    let clean = assert_validation_success!(engine.validate_record(
        &article,
        &json!({"slug": "hello-42"}),
        &store
    ));
    assert_eq!(clean["slug"], json!("hello-42"));

    assert_field_message_contains!(
        engine.validate_record(&article, &json!({"slug": "Hello"}), &store),
        "slug",
        "lower-case slug"
    );
    assert_field_message_contains!(
        engine.validate_record(&article, &json!({"slug": "much-too-long"}), &store),
        "slug",
        "Longer than 10"
    );

    let describe = engine.registry().describe("slug").unwrap();
    assert_eq!(describe["node"], json!("string"));
    assert_eq!(describe["keys"][5]["name"], json!("max_length"));
    assert_eq!(describe["keys"][5]["default"], json!(32));
}

/// Test types removed from the engine are no longer declarable
#[test]
fn test_engine_without_geojson() {
    let engine = ValidationEngine::builder()
        .with_builtin_types()
        .without_type("geojson")
        .build()
        .unwrap();
    let store = InMemoryStorage::new();

    assert_eq!(engine.field_types().len(), 20);
    let raw = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("shape", "geojson"))
        .build();
    assert_error_fields!(engine.validate_definition(&raw, &store), ["fields.0.type"]);
}

/// Test the capability listing of a built-in type
#[test]
fn test_describe_range() {
    let (engine, _) = setup();
    let range = engine.registry().describe("range").unwrap();

    assert_eq!(range["name"], json!("range"));
    assert_eq!(range["node"], json!("integer"));
    let keys: Vec<&str> = range["keys"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|k| k["name"].as_str())
        .collect();
    assert_eq!(keys, vec!["name", "label", "hint", "required", "type", "min", "max"]);
}

/// One declaration and one known-good value per built-in type
fn known_good_values() -> Vec<(Value, Value)> {
    vec![
        (json!({"name": "v", "type": "anyof", "model": "species"}), json!("plane")),
        (json!({"name": "v", "type": "boolean"}), json!("yes")),
        (json!({"name": "v", "type": "choices", "choices": ["a", "b"]}), json!("[a]")),
        (json!({"name": "v", "type": "date"}), json!("2024-02-29")),
        (json!({"name": "v", "type": "datetime"}), json!("2024-06-01T12:00:00+02:00")),
        (json!({"name": "v", "type": "decimal"}), json!("1.5")),
        (json!({"name": "v", "type": "email"}), json!("ada@example.org")),
        (json!({"name": "v", "type": "enum", "choices": ["a", "b"]}), json!("b")),
        (
            json!({"name": "v", "type": "geojson"}),
            json!({"type": "Point", "coordinates": [4, 45]}),
        ),
        (json!({"name": "v", "type": "int"}), json!("30")),
        (json!({"name": "v", "type": "line"}), json!([[0, 0], [1, 1]])),
        (json!({"name": "v", "type": "list", "item": {"type": "int"}}), json!("[1,2,3]")),
        (
            json!({"name": "v", "type": "object", "fields": [{"name": "x", "type": "int"}]}),
            json!({"x": "1"}),
        ),
        (json!({"name": "v", "type": "oneof", "model": "species"}), json!("plane")),
        (json!({"name": "v", "type": "point"}), json!([1, 2])),
        (json!({"name": "v", "type": "polygon"}), json!([[[0, 0], [1, 0], [0, 1]]])),
        (json!({"name": "v", "type": "range", "min": 0, "max": 10}), json!(5)),
        (json!({"name": "v", "type": "regex", "regex": "[a-z]+"}), json!("abc")),
        (json!({"name": "v", "type": "string"}), json!("x")),
        (json!({"name": "v", "type": "text"}), json!("longer text")),
        (json!({"name": "v", "type": "url"}), json!("https://example.org/trees")),
    ]
}

/// Test every registered type accepts a known-good value, and clean values
/// validate again to themselves
#[test]
fn test_every_type_has_a_good_value() {
    let (engine, store) = setup();
    define_and_store(&engine, &store, "species", &catalogue::species());
    store
        .put_record("species", "plane", json!({"latin": "Platanus", "evergreen": false}))
        .unwrap();

    let cases = known_good_values();
    let mut covered: Vec<String> = cases
        .iter()
        .filter_map(|(declaration, _)| declaration["type"].as_str().map(str::to_string))
        .collect();
    covered.sort();
    assert_eq!(covered, engine.field_types());

    for (declaration, raw) in cases {
        let clean = validate_value(&engine, &store, declaration.clone(), raw.clone())
            .unwrap_or_else(|e| panic!("{} rejected {}: {}", declaration["type"], raw, e));
        let again = validate_value(&engine, &store, declaration.clone(), clean.clone())
            .unwrap_or_else(|e| {
                panic!("{} rejected its clean value {}: {}", declaration["type"], clean, e)
            });
        assert_eq!(again, clean, "{}", declaration["type"]);
    }
}

/// Test the optional integer scenario from declaration to clean record
#[test]
fn test_optional_age_scenario() {
    let (engine, store) = setup();
    let definition = define(&engine, &store, &catalogue::minimal());

    let empty = assert_validation_success!(engine.validate_record(&definition, &json!({}), &store));
    assert!(empty.is_empty());

    let aged = assert_validation_success!(engine.validate_record(
        &definition,
        &json!({"age": "30"}),
        &store
    ));
    assert_eq!(Value::Object(aged), json!({"age": 30}));

    assert_error_fields!(
        engine.validate_record(&definition, &json!({"age": "x"}), &store),
        ["age"]
    );
}
