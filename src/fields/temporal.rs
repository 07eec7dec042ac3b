//! Date and date-time field types.
//!
//! Both accept ISO-8601 input and render their clean value back as an
//! ISO-8601 string. The `auto_now` declaration flag is implemented by the
//! [`auto_now`] decorator, which wraps the base validator and supplies the
//! current date or instant whenever no value is given.

use super::{FieldType, FieldValidator, ValidationContext, ValueKind};
use crate::coercion::value_type;
use crate::error::{BuildResult, ValidationError, ValidationResult};
use crate::schema::{FieldDeclaration, Schema, SchemaNode};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn raw_str<'v>(raw: &'v Value, expected: &str) -> ValidationResult<&'v str> {
    raw.as_str()
        .map(str::trim)
        .ok_or_else(|| ValidationError::invalid_type(expected, value_type(raw)))
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parse a calendar date. Date-times are accepted and truncated to their date.
pub(crate) fn parse_date(raw: &Value) -> ValidationResult<NaiveDate> {
    let s = raw_str(raw, "date")?;
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.date()))
        .ok_or_else(|| ValidationError::InvalidDate {
            value: s.to_string(),
        })
}

/// Parse an instant. Naive date-times are read as UTC, bare dates as midnight UTC.
pub(crate) fn parse_datetime(raw: &Value) -> ValidationResult<DateTime<Utc>> {
    let s = raw_str(raw, "datetime")?;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.and_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
        .ok_or_else(|| ValidationError::InvalidDateTime {
            value: s.to_string(),
        })
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_datetime(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn today() -> Value {
    Value::String(format_date(Utc::now().date_naive()))
}

fn now() -> Value {
    Value::String(format_datetime(Utc::now()))
}

/// Supply a fresh value from `clock` whenever the field is left blank.
///
/// The clock runs inside the validator, so every record validated gets its
/// own timestamp.
pub fn auto_now<'a>(validator: FieldValidator<'a>, clock: fn() -> Value) -> FieldValidator<'a> {
    validator.with_missing(move || Some(clock()))
}

fn temporal_schema() -> Schema {
    Schema::envelope().with_default("auto_now", SchemaNode::Boolean, Value::Bool(false))
}

/// ISO-8601 calendar date field
#[derive(Debug, Clone, Copy, Default)]
pub struct DateField;

impl FieldType for DateField {
    fn node(&self) -> ValueKind {
        ValueKind::Date
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        temporal_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let validator = FieldValidator::for_kind(declaration, self.node());
        if declaration.bool_option("auto_now", false) {
            return Ok(auto_now(validator, today));
        }
        Ok(validator)
    }
}

/// ISO-8601 instant field, normalized to UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeField;

impl FieldType for DateTimeField {
    fn node(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn definition(&self, _options: &Map<String, Value>) -> Schema {
        temporal_schema()
    }

    fn validation<'a>(
        &self,
        declaration: &FieldDeclaration,
        _ctx: ValidationContext<'a>,
    ) -> BuildResult<FieldValidator<'a>> {
        let validator = FieldValidator::for_kind(declaration, self.node());
        if declaration.bool_option("auto_now", false) {
            return Ok(auto_now(validator, now));
        }
        Ok(validator)
    }
}
