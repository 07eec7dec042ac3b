//! Geometry field validation tests.
//!
//! Points, lines, polygons and raw GeoJSON, supplied natively or as JSON
//! encoded strings.

use crate::common::builders::{DefinitionBuilder, FieldBuilder, square};
use crate::common::{define, setup, validate_value};
use serde_json::json;

/// Test point values, native and JSON-encoded
#[test]
fn test_point_values() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("at", "point").build();

    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), json!([2, 48])).unwrap(),
        json!([2.0, 48.0])
    );
    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), json!("[2.35, 48.85, 35]")).unwrap(),
        json!([2.35, 48.85, 35.0])
    );
    assert_eq!(
        validate_value(&engine, &store, declaration, json!(["-0.5", "51.5"])).unwrap(),
        json!([-0.5, 51.5])
    );
}

/// Test points sent in the comma separated list form
#[test]
fn test_point_comma_separated() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("at", "point").build();

    for raw in [json!("1.5,2.5"), json!("[1.5,2.5]"), json!("1.5, 2.5")] {
        assert_eq!(
            validate_value(&engine, &store, declaration.clone(), raw.clone()).unwrap(),
            json!([1.5, 2.5]),
            "{}",
            raw
        );
    }
    assert_field_message_contains!(
        validate_value(&engine, &store, declaration, json!("200,45")),
        "at",
        "longitude 200 is outside [-180, 180]"
    );
}

/// Test the GPS bounds and how the gps flag turns them off
#[test]
fn test_point_gps_bounds() {
    let (engine, store) = setup();
    let gps = FieldBuilder::new("at", "point").build();
    let planar = FieldBuilder::new("at", "point").option("gps", json!(false)).build();

    assert_field_message_contains!(
        validate_value(&engine, &store, gps.clone(), json!([200, 45])),
        "at",
        "longitude 200 is outside [-180, 180]"
    );
    assert_field_message_contains!(
        validate_value(&engine, &store, gps.clone(), json!([0, -91])),
        "at",
        "latitude -91 is outside [-90, 90]"
    );
    assert!(validate_value(&engine, &store, gps, json!([180, -90])).is_ok());
    assert_eq!(
        validate_value(&engine, &store, planar, json!([200, 45])).unwrap(),
        json!([200.0, 45.0])
    );
}

/// Test malformed points
#[test]
fn test_malformed_points() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("at", "point").build();

    for raw in [json!([1]), json!(["east", 1]), json!("[1, 2"), json!({"x": 1, "y": 2})] {
        assert_error_fields!(
            validate_value(&engine, &store, declaration.clone(), raw),
            ["at"]
        );
    }
}

/// Test the gps flag defaults to true in the normalized declaration
#[test]
fn test_gps_flag_default() {
    let (engine, store) = setup();
    let definition = define(
        &engine,
        &store,
        &DefinitionBuilder::new("T")
            .field(FieldBuilder::new("at", "point"))
            .field(FieldBuilder::new("path", "line").option("gps", json!("no")))
            .build(),
    );

    assert_eq!(definition.fields[0].option("gps"), Some(&json!(true)));
    assert_eq!(definition.fields[1].option("gps"), Some(&json!(false)));
}

/// Test lines need two positions
#[test]
fn test_line_values() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("path", "line").build();

    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), json!("[[0, 0], [1, 1], [2, 0]]"))
            .unwrap(),
        json!([[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]])
    );
    assert_field_message_contains!(
        validate_value(&engine, &store, declaration.clone(), json!([[0, 0]])),
        "path",
        "at least 2 points"
    );
    assert_error_fields!(
        validate_value(&engine, &store, declaration, json!([[0, 0], [500, 0]])),
        ["path"]
    );
}

/// Test polygon rings are closed and validated
#[test]
fn test_polygon_values() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("area", "polygon").build();

    let open = json!([[[0, 0], [4, 0], [4, 4], [0, 4]]]);
    assert_eq!(
        validate_value(&engine, &store, declaration.clone(), open).unwrap(),
        json!([[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]])
    );

    let with_hole = json!([square(0.0, 0.0, 10.0), square(2.0, 2.0, 1.0)]);
    let clean = validate_value(&engine, &store, declaration.clone(), with_hole).unwrap();
    assert_eq!(clean.as_array().map(Vec::len), Some(2));
    assert_eq!(clean[1].as_array().map(Vec::len), Some(5));

    assert_field_message_contains!(
        validate_value(&engine, &store, declaration.clone(), json!([[[0, 0], [1, 1]]])),
        "area",
        "at least 3 points"
    );
    assert_field_message_contains!(
        validate_value(&engine, &store, declaration, json!("[]")),
        "area",
        "at least 1 ring"
    );
}

/// Test GeoJSON geometries of every type
#[test]
fn test_geojson_values() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("shape", "geojson").build();

    for geometry in [
        json!({"type": "Point", "coordinates": [1, 2]}),
        json!({"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]}),
        json!({"type": "LineString", "coordinates": [[1, 2], [3, 4]]}),
        json!({"type": "MultiLineString", "coordinates": [[[1, 2], [3, 4]]]}),
        json!({"type": "Polygon", "coordinates": [square(0.0, 0.0, 1.0)]}),
        json!({
            "type": "MultiPolygon",
            "coordinates": [[square(0.0, 0.0, 1.0)], [square(5.0, 5.0, 1.0)]]
        }),
        json!({
            "type": "GeometryCollection",
            "geometries": [{"type": "Point", "coordinates": [0, 0]}]
        }),
    ] {
        assert!(
            validate_value(&engine, &store, declaration.clone(), geometry.clone()).is_ok(),
            "{} should be accepted",
            geometry
        );
    }
}

/// Test GeoJSON encoded as a string, with normalization of coordinates
#[test]
fn test_geojson_string_is_decoded() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("shape", "geojson").build();

    let clean = validate_value(
        &engine,
        &store,
        declaration,
        json!("{\"type\": \"Polygon\", \"coordinates\": [[[0, 0], [1, 0], [1, 1]]], \"id\": 7}"),
    )
    .unwrap();

    assert_eq!(
        clean,
        json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            "id": 7
        })
    );
}

/// Test malformed GeoJSON
#[test]
fn test_malformed_geojson() {
    let (engine, store) = setup();
    let declaration = FieldBuilder::new("shape", "geojson").build();

    for (geometry, expected) in [
        (json!({"type": "Circle", "coordinates": [0, 0]}), "unknown geometry type"),
        (json!({"coordinates": [0, 0]}), "'type' is required"),
        (json!({"type": "LineString"}), "'coordinates' is required"),
        (json!({"type": "GeometryCollection"}), "'geometries' is required"),
        (json!({"type": "Point", "coordinates": [0, 100]}), "latitude"),
        (
            json!({
                "type": "GeometryCollection",
                "geometries": [{"type": "Point", "coordinates": [1]}]
            }),
            "at least 2 coordinates",
        ),
    ] {
        assert_field_message_contains!(
            validate_value(&engine, &store, declaration.clone(), geometry),
            "shape",
            expected
        );
    }

    assert_field_message_contains!(
        validate_value(&engine, &store, declaration, json!([1, 2])),
        "shape",
        "Expected object"
    );
}
