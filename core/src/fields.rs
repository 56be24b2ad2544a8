//! Request-body casting.
//!
//! Bodies arrive as loose JSON objects. Each service pulls the fields it
//! recognises out of a [`Fields`] map and casts them the way a document
//! store would: numeric strings become numbers, date strings become
//! timestamps, enum values must match exactly. Unrecognised keys are ignored.

use crate::{
    error::{DeskError, DeskResult},
    types::Timestamp,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::str::FromStr;

/// One field lookup: absent, explicitly `null`, or a cast value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Missing,
    Null,
    Set(T),
}

impl<T> Field<T> {
    /// Merge into an optional slot. `Missing` leaves the slot untouched.
    pub fn merge_into(self, slot: &mut Option<T>) {
        match self {
            Field::Missing => {}
            Field::Null => *slot = None,
            Field::Set(v) => *slot = Some(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    map: Map<String, Value>,
}

impl Fields {
    /// Wrap a request body. Anything other than a JSON object is rejected.
    pub fn from_json(body: Value) -> DeskResult<Self> {
        match body {
            Value::Object(map) => Ok(Self { map }),
            other => Err(DeskError::validation(format!(
                "request body must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn lookup(&self, key: &str) -> Field<&Value> {
        match self.map.get(key) {
            None => Field::Missing,
            Some(Value::Null) => Field::Null,
            Some(v) => Field::Set(v),
        }
    }

    pub fn string(&self, key: &str) -> DeskResult<Field<String>> {
        self.cast(key, cast_string)
    }

    pub fn number(&self, key: &str) -> DeskResult<Field<f64>> {
        match self.cast(key, cast_number)? {
            Field::Set(None) => Ok(Field::Null),
            Field::Set(Some(n)) => Ok(Field::Set(n)),
            Field::Null => Ok(Field::Null),
            Field::Missing => Ok(Field::Missing),
        }
    }

    pub fn integer(&self, key: &str) -> DeskResult<Field<i64>> {
        match self.number(key)? {
            Field::Set(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Ok(Field::Set(n as i64))
            }
            Field::Set(n) => Err(cast_error(key, "integer", &Value::from(n))),
            Field::Null => Ok(Field::Null),
            Field::Missing => Ok(Field::Missing),
        }
    }

    pub fn boolean(&self, key: &str) -> DeskResult<Field<bool>> {
        self.cast(key, cast_bool)
    }

    pub fn date(&self, key: &str) -> DeskResult<Field<Timestamp>> {
        self.cast(key, cast_date)
    }

    /// A string restricted to the values `E` knows how to parse.
    pub fn choice<E: FromStr<Err = String>>(&self, key: &str) -> DeskResult<Field<E>> {
        match self.string(key)? {
            Field::Set(raw) => raw
                .parse::<E>()
                .map(Field::Set)
                .map_err(|e| DeskError::validation(format!("{key}: {e}"))),
            Field::Null => Ok(Field::Null),
            Field::Missing => Ok(Field::Missing),
        }
    }

    pub fn object(&self, key: &str) -> DeskResult<Field<Fields>> {
        self.cast(key, |key, v| match v {
            Value::Object(map) => Ok(Fields { map: map.clone() }),
            other => Err(cast_error(key, "object", other)),
        })
    }

    /// An array of nested objects, each wrapped as its own [`Fields`].
    pub fn object_list(&self, key: &str) -> DeskResult<Field<Vec<Fields>>> {
        self.cast(key, |key, v| match v {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(Fields { map: map.clone() }),
                    other => Err(cast_error(&format!("{key}.{i}"), "object", other)),
                })
                .collect(),
            other => Err(cast_error(key, "array", other)),
        })
    }

    fn cast<T>(
        &self,
        key: &str,
        f: impl FnOnce(&str, &Value) -> DeskResult<T>,
    ) -> DeskResult<Field<T>> {
        match self.lookup(key) {
            Field::Missing => Ok(Field::Missing),
            Field::Null => Ok(Field::Null),
            Field::Set(v) => f(key, v).map(Field::Set),
        }
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self { map }
    }
}

/// Empty strings do not satisfy a required field.
pub(crate) fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            missing.push(name);
            None
        }
    }
}

fn cast_string(key: &str, v: &Value) -> DeskResult<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(cast_error(key, "string", other)),
    }
}

/// `Ok(None)` for an empty string, which counts as "no value".
fn cast_number(key: &str, v: &Value) -> DeskResult<Option<f64>> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| cast_error(key, "number", v)),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| cast_error(key, "number", v)),
        other => Err(cast_error(key, "number", other)),
    }
}

fn cast_bool(key: &str, v: &Value) -> DeskResult<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" || s == "1" || s == "yes" => Ok(true),
        Value::String(s) if s == "false" || s == "0" || s == "no" => Ok(false),
        Value::Number(n) if n.as_f64() == Some(1.0) => Ok(true),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(false),
        other => Err(cast_error(key, "boolean", other)),
    }
}

fn cast_date(key: &str, v: &Value) -> DeskResult<Timestamp> {
    match v {
        Value::String(s) => parse_date(s.trim()).ok_or_else(|| cast_error(key, "date", v)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| cast_error(key, "date", v)),
        other => Err(cast_error(key, "date", other)),
    }
}

/// Accepts RFC 3339, a bare `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) or a
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(s: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn cast_error(key: &str, kind: &str, v: &Value) -> DeskError {
    DeskError::validation(format!("{key}: cannot cast {v} to {kind}"))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
