//! Scalar field validation tests.
//!
//! Declarations of int, string, text, decimal, boolean, enum, choices, range,
//! regex, email and url fields, and the values they accept.

use crate::common::builders::{DefinitionBuilder, FieldBuilder};
use crate::common::{define, setup, validate_value};
use serde_json::{Value, json};

fn field(name: &str, type_name: &str) -> Value {
    FieldBuilder::new(name, type_name).build()
}

/// Test integer coercion from numbers and numeric strings
#[test]
fn test_int_values() {
    let (engine, store) = setup();

    assert_eq!(validate_value(&engine, &store, field("n", "int"), json!(42)).unwrap(), json!(42));
    assert_eq!(validate_value(&engine, &store, field("n", "int"), json!("-7")).unwrap(), json!(-7));
    assert_eq!(
        validate_value(&engine, &store, field("n", "int"), json!(" 12 ")).unwrap(),
        json!(12)
    );

    let result = validate_value(&engine, &store, field("n", "int"), json!("twelve"));
    assert_field_message_contains!(result, "n", "is not a number");

    let result = validate_value(&engine, &store, field("n", "int"), json!(true));
    assert_field_message_contains!(result, "n", "Expected integer");
}

/// Test decimal coercion
#[test]
fn test_decimal_values() {
    let (engine, store) = setup();

    assert_eq!(
        validate_value(&engine, &store, field("x", "decimal"), json!("3.25")).unwrap(),
        json!(3.25)
    );
    assert_eq!(
        validate_value(&engine, &store, field("x", "decimal"), json!(2)).unwrap(),
        json!(2.0)
    );
    assert!(validate_value(&engine, &store, field("x", "decimal"), json!("inf")).is_err());
}

/// Test string and text fields render scalars as text
#[test]
fn test_string_and_text_values() {
    let (engine, store) = setup();

    assert_eq!(
        validate_value(&engine, &store, field("s", "string"), json!(12)).unwrap(),
        json!("12")
    );
    assert_eq!(
        validate_value(&engine, &store, field("s", "text"), json!("line one\nline two")).unwrap(),
        json!("line one\nline two")
    );
    assert_error_fields!(
        validate_value(&engine, &store, field("s", "string"), json!({"a": 1})),
        ["s"]
    );
}

/// Test boolean spellings
#[test]
fn test_boolean_values() {
    let (engine, store) = setup();

    for (raw, expected) in [
        (json!(true), true),
        (json!("TRUE"), true),
        (json!("on"), true),
        (json!(1), true),
        (json!("no"), false),
        (json!("0"), false),
    ] {
        assert_eq!(
            validate_value(&engine, &store, field("b", "boolean"), raw.clone()).unwrap(),
            json!(expected),
            "{}",
            raw
        );
    }

    let result = validate_value(&engine, &store, field("b", "boolean"), json!(2));
    assert_field_message_contains!(result, "b", "neither true nor false");
}

/// Test that missing, null and empty values fail a required field
#[test]
fn test_required_field_missing() {
    let (engine, store) = setup();
    let definition = define(
        &engine,
        &store,
        &DefinitionBuilder::new("T").field(field("n", "int")).build(),
    );

    for record in [json!({}), json!({"n": null}), json!({"n": ""})] {
        let result = engine.validate_record(&definition, &record, &store);
        assert_field_message_contains!(result, "n", "Required");
    }
}

/// Test that blank optional fields are omitted from the clean record
#[test]
fn test_optional_field_missing() {
    let (engine, store) = setup();
    let definition = define(
        &engine,
        &store,
        &DefinitionBuilder::new("T")
            .field(FieldBuilder::new("n", "int").optional())
            .build(),
    );

    for record in [json!({}), json!({"n": null}), json!({"n": ""})] {
        let clean =
            assert_validation_success!(engine.validate_record(&definition, &record, &store));
        assert!(clean.is_empty(), "{} should produce an empty record", record);
    }
}

/// Test enum declarations
#[test]
fn test_enum_declaration() {
    let (engine, store) = setup();

    let missing = DefinitionBuilder::new("T").field(field("size", "enum")).build();
    assert_error_fields!(engine.validate_definition(&missing, &store), ["fields.0.choices"]);

    let empty = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("size", "enum").option("choices", json!([])))
        .build();
    assert_error_fields!(engine.validate_definition(&empty, &store), ["fields.0.choices"]);

    let numbers = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("size", "enum").option("choices", json!([1, 2])))
        .build();
    assert_field_message_contains!(
        engine.validate_definition(&numbers, &store),
        "fields.0.choices",
        "Expected string"
    );

    for blank in [json!(""), json!("S,,L"), json!(["S", " "])] {
        let raw = DefinitionBuilder::new("T")
            .field(FieldBuilder::new("size", "enum").option("choices", blank))
            .build();
        assert_field_message_contains!(
            engine.validate_definition(&raw, &store),
            "fields.0.choices",
            "blank entries"
        );
    }
}

/// Test enum values
#[test]
fn test_enum_values() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("size", "enum")
        .option("choices", json!("[S,M,L]"))
        .build();

    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), json!("M")).unwrap(),
        json!("M")
    );
    let result = validate_value(&engine, &store, declaration, json!("XL"));
    assert_field_message_contains!(result, "size", "\"XL\" is not one of S, M, L");
}

/// Test multi-select choices, including the CSV fallback
#[test]
fn test_choices_values() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("tags", "choices")
        .option("choices", json!(["red", "green", "blue"]))
        .build();

    for (raw, expected) in [
        (json!(["red", "blue"]), json!(["red", "blue"])),
        (json!("[\"green\"]"), json!(["green"])),
        (json!("[red,green]"), json!(["red", "green"])),
        (json!("blue"), json!(["blue"])),
    ] {
        assert_eq!(
            validate_value(&engine, &store, declaration.clone(), raw.clone()).unwrap(),
            expected,
            "{}",
            raw
        );
    }

    // CSV pieces are not trimmed
    let result = validate_value(&engine, &store, declaration.clone(), json!("red, green"));
    assert_field_message_contains!(result, "tags", "\" green\"");

    let result = validate_value(&engine, &store, declaration, json!("purple"));
    assert_error_fields!(result, ["tags"]);
}

/// Test range declarations
#[test]
fn test_range_declaration() {
    let (engine, store) = setup();

    let missing_max = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("r", "range").option("min", json!(0)))
        .build();
    assert_error_fields!(engine.validate_definition(&missing_max, &store), ["fields.0.max"]);

    let inverted = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("r", "range").option("min", json!(10)).option("max", json!(1)))
        .build();
    assert_field_message_contains!(
        engine.validate_definition(&inverted, &store),
        "fields.0.min",
        "must not be greater than"
    );

    let equal = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("r", "range").option("min", json!(5)).option("max", json!("5")))
        .build();
    assert!(engine.validate_definition(&equal, &store).is_ok());
}

/// Test range values are inclusive
#[test]
fn test_range_values() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("percent", "range")
        .option("min", json!(0))
        .option("max", json!(100))
        .build();

    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), json!("0")).unwrap(),
        json!(0)
    );
    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), json!(100)).unwrap(),
        json!(100)
    );
    let result = validate_value(&engine, &store, declaration, json!(101));
    assert_field_message_contains!(result, "percent", "101 is out of range [0, 100]");
}

/// Test regex declarations and values
#[test]
fn test_regex_field() {
    let (engine, store) = setup();

    let broken = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("code", "regex").option("regex", json!("[a-z")))
        .build();
    assert_field_message_contains!(
        engine.validate_definition(&broken, &store),
        "fields.0.regex",
        "Invalid regular expression"
    );

    let unbalanced = DefinitionBuilder::new("T")
        .field(FieldBuilder::new("code", "regex").option("regex", json!("a)|(?:b")))
        .build();
    assert_field_message_contains!(
        engine.validate_definition(&unbalanced, &store),
        "fields.0.regex",
        "Invalid regular expression"
    );

    let declaration = FieldBuilder::new("code", "regex")
        .option("regex", json!("[A-Z]{2}-[0-9]+"))
        .build();
    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), json!("FR-75")).unwrap(),
        json!("FR-75")
    );
    let result = validate_value(&engine, &store, declaration, json!("FR-75x"));
    assert_field_message_contains!(result, "code", "does not match expected pattern");
}

/// Test email values
#[test]
fn test_email_values() {
    let (engine, store) = setup();

    for ok in ["ada@example.com", "o'brien@mail.example.ie", "x.y+z@sub.domain.org"] {
        assert!(
            validate_value(&engine, &store, field("email", "email"), json!(ok)).is_ok(),
            "{} should be accepted",
            ok
        );
    }
    for bad in ["plainaddress", "@example.com", "ada@", "ada@example", "a b@example.com"] {
        assert_field_message_contains!(
            validate_value(&engine, &store, field("email", "email"), json!(bad)),
            "email",
            "Invalid email"
        );
    }
}

/// Test url values
#[test]
fn test_url_values() {
    let (engine, store) = setup();

    for ok in ["https://example.com", "http://localhost:3000/api?x=1", "ftp://10.0.0.1/pub"] {
        assert!(
            validate_value(&engine, &store, field("site", "url"), json!(ok)).is_ok(),
            "{} should be accepted",
            ok
        );
    }
    for bad in ["www.example.com", "mailto:ada@example.com", "https://"] {
        assert_field_message_contains!(
            validate_value(&engine, &store, field("site", "url"), json!(bad)),
            "site",
            "Must be a URL"
        );
    }
}
