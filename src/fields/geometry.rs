//! Geometry field types.
//!
//! Coordinates are decoded from native arrays, JSON-encoded strings or the
//! comma separated list form. Each ordinate may be a number or a numeric
//! string, and clean values always carry floats. With `gps` set (the
//! default) the first two ordinates are checked as longitude and latitude.

use super::{FieldType, FieldValidator, ValidationContext, ValueKind};
use crate::coercion::{decode_json, decode_json_object, json_or_csv_list, value_type};
use crate::error::{BuildResult, ValidationError, ValidationResult};
use crate::schema::{FieldDeclaration, Schema, SchemaNode};
use serde_json::{Map, Value};

/// GeoJSON geometry types accepted by the `geojson` field.
pub const GEOJSON_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

fn gps_schema() -> Schema {
    Schema::envelope().with_default("gps", SchemaNode::Boolean, Value::Bool(true))
}

fn as_array<'v>(value: &'v Value, what: &str) -> ValidationResult<&'v Vec<Value>> {
    value.as_array().ok_or_else(|| {
        ValidationError::geometry(format!("{} must be an array, got {}", what, value_type(value)))
    })
}

fn ordinate(value: &Value) -> ValidationResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| ValidationError::geometry(format!("{} is not a coordinate", value)))
}

/// Validate a single position: at least two finite ordinates.
pub fn validate_point(value: &Value, gps: bool) -> ValidationResult<Vec<f64>> {
    let items = as_array(value, "point")?;
    if items.len() < 2 {
        return Err(ValidationError::geometry(format!(
            "point needs at least 2 coordinates, got {}",
            items.len()
        )));
    }
    let coords = items.iter().map(ordinate).collect::<ValidationResult<Vec<_>>>()?;
    if gps {
        let (lon, lat) = (coords[0], coords[1]);
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::geometry(format!(
                "longitude {} is outside [-180, 180]",
                lon
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::geometry(format!(
                "latitude {} is outside [-90, 90]",
                lat
            )));
        }
    }
    Ok(coords)
}

/// Validate a line: at least two positions.
pub fn validate_line(value: &Value, gps: bool) -> ValidationResult<Vec<Vec<f64>>> {
    let points = positions(value, gps, "line")?;
    if points.len() < 2 {
        return Err(ValidationError::geometry(format!(
            "line needs at least 2 points, got {}",
            points.len()
        )));
    }
    Ok(points)
}

/// Validate a polygon: one or more rings of at least three positions.
///
/// Open rings are closed by appending their first position.
pub fn validate_polygon(value: &Value, gps: bool) -> ValidationResult<Vec<Vec<Vec<f64>>>> {
    let rings = as_array(value, "polygon")?;
    if rings.is_empty() {
        return Err(ValidationError::geometry("polygon needs at least 1 ring"));
    }
    rings
        .iter()
        .map(|ring| {
            let mut points = positions(ring, gps, "ring")?;
            if points.len() < 3 {
                return Err(ValidationError::geometry(format!(
                    "ring needs at least 3 points, got {}",
                    points.len()
                )));
            }
            if points.first() != points.last() {
                points.push(points[0].clone());
            }
            Ok(points)
        })
        .collect()
}

fn positions(value: &Value, gps: bool, what: &str) -> ValidationResult<Vec<Vec<f64>>> {
    as_array(value, what)?
        .iter()
        .map(|p| validate_point(p, gps))
        .collect()
}

fn each<T>(
    value: &Value,
    what: &str,
    check: impl Fn(&Value, bool) -> ValidationResult<T>,
    gps: bool,
) -> ValidationResult<Vec<T>> {
    as_array(value, what)?.iter().map(|v| check(v, gps)).collect()
}

/// Validate a GeoJSON geometry object, recursing into collections.
///
/// Returns the object with normalized coordinates; keys other than `type`,
/// `coordinates` and `geometries` are kept as sent.
pub fn validate_geojson(value: &Value, gps: bool) -> ValidationResult<Map<String, Value>> {
    let mut geometry = match decode_json(value)? {
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::geometry(format!(
                "geometry must be an object, got {}",
                value_type(&other)
            )));
        }
    };
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::geometry("'type' is required"))?
        .to_string();
    if !GEOJSON_TYPES.contains(&kind.as_str()) {
        return Err(ValidationError::geometry(format!("unknown geometry type '{}'", kind)));
    }

    if kind == "GeometryCollection" {
        let members = geometry
            .get("geometries")
            .ok_or_else(|| ValidationError::geometry("'geometries' is required"))?;
        let members = as_array(members, "geometries")?
            .iter()
            .map(|g| validate_geojson(g, gps).map(Value::Object))
            .collect::<ValidationResult<Vec<_>>>()?;
        geometry.insert("geometries".to_string(), Value::Array(members));
        return Ok(geometry);
    }

    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| {
            ValidationError::geometry(format!("'coordinates' is required for {}", kind))
        })?;
    let normalized = match kind.as_str() {
        "Point" => to_value(validate_point(coordinates, gps)?),
        "MultiPoint" => to_value(each(coordinates, "coordinates", validate_point, gps)?),
        "LineString" => to_value(validate_line(coordinates, gps)?),
        "MultiLineString" => to_value(each(coordinates, "coordinates", validate_line, gps)?),
        "Polygon" => to_value(validate_polygon(coordinates, gps)?),
        "MultiPolygon" => to_value(each(coordinates, "coordinates", validate_polygon, gps)?),
        other => {
            return Err(ValidationError::geometry(format!("'{}' takes no coordinates", other)));
        }
    };
    geometry.insert("coordinates".to_string(), normalized);
    Ok(geometry)
}

/// Outer array of a point, line or polygon value.
fn coordinates(raw: &Value) -> ValidationResult<Value> {
    json_or_csv_list(raw).map(Value::Array)
}

fn to_value<T: serde::Serialize>(coords: T) -> Value {
    serde_json::to_value(coords).unwrap_or(Value::Null)
}

/// Single position, `[lon, lat, ...]`
#[derive(Debug, Clone, Copy, Default)]
pub struct PointField;

impl FieldType for PointField {
    fn node(&self) -> ValueKind {
        ValueKind::Sequence
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        gps_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let gps = declaration.bool_option("gps", true);
        Ok(FieldValidator::new(declaration, move |raw| {
            let decoded = coordinates(raw)?;
            validate_point(&decoded, gps).map(to_value)
        }))
    }
}

/// Line string, two or more positions
#[derive(Debug, Clone, Copy, Default)]
pub struct LineField;

impl FieldType for LineField {
    fn node(&self) -> ValueKind {
        ValueKind::Sequence
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        gps_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let gps = declaration.bool_option("gps", true);
        Ok(FieldValidator::new(declaration, move |raw| {
            let decoded = coordinates(raw)?;
            validate_line(&decoded, gps).map(to_value)
        }))
    }
}

/// Polygon, a list of linear rings (exterior first, then holes)
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonField;

impl FieldType for PolygonField {
    fn node(&self) -> ValueKind {
        ValueKind::Sequence
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        gps_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let gps = declaration.bool_option("gps", true);
        Ok(FieldValidator::new(declaration, move |raw| {
            let decoded = coordinates(raw)?;
            validate_polygon(&decoded, gps).map(to_value)
        }))
    }
}

/// Raw GeoJSON geometry or geometry collection
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonField;

impl FieldType for GeoJsonField {
    fn node(&self) -> ValueKind {
        ValueKind::Mapping
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        gps_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let gps = declaration.bool_option("gps", true);
        Ok(FieldValidator::new(declaration, move |raw| {
            let object = decode_json_object(raw)?;
            validate_geojson(&Value::Object(object), gps).map(Value::Object)
        }))
    }
}
