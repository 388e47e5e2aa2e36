//! Flat ingestion records and lenient field coercion.
//!
//! A [`Record`] is one row of key/value pairs as handed over by the caller:
//! from CSV every value is a string, from JSON sources values may already be
//! numbers or booleans.  The coercion helpers accept both.
//!
//! | Helper           | Accepts                                               | Absent when                  |
//! |------------------|-------------------------------------------------------|------------------------------|
//! | [`int_field`]    | integer numbers, `"42"`, integral floats like `"42.0"` | missing, `null`, blank      |
//! | [`float_field`]  | numbers, numeric strings                              | missing, `null`, blank       |
//! | [`bool_field`]   | booleans, `0/1`, `true/false/yes/no` (any case)       | missing, `null`, blank       |
//! | [`text_field`]   | strings (trimmed), numbers and booleans as text       | missing, `null`, blank       |
//! | [`tags_field`]   | JSON objects, JSON or Python-literal dict strings     | missing, `null`, blank → `{}`|
//!
//! Blank means empty after trimming, which is how CSV writers render a null.

use std::collections::BTreeMap;

use serde_json::Value;

use sg_core::Tags;

use crate::error::{RowError, RowResult};
use crate::tagblob::parse_tag_blob;

/// One flat input row.
pub type Record = BTreeMap<String, Value>;

/// Build a record from string pairs.
pub fn record<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Record {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

/// The field's value, or `None` if it is missing, `null` or blank.
fn present<'a>(rec: &'a Record, key: &str) -> Option<&'a Value> {
    match rec.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        v => Some(v),
    }
}

pub fn int_field(rec: &Record, key: &'static str) -> RowResult<Option<i64>> {
    let Some(v) = present(rec, key) else {
        return Ok(None);
    };
    let parsed = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| RowError::malformed(key, format!("expected an integer, got {v}")))
}

pub fn float_field(rec: &Record, key: &'static str) -> RowResult<Option<f64>> {
    let Some(v) = present(rec, key) else {
        return Ok(None);
    };
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| RowError::malformed(key, format!("expected a number, got {v}")))
}

pub fn bool_field(rec: &Record, key: &'static str) -> RowResult<Option<bool>> {
    let Some(v) = present(rec, key) else {
        return Ok(None);
    };
    let parsed = match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| RowError::malformed(key, format!("expected a boolean, got {v}")))
}

pub fn text_field(rec: &Record, key: &str) -> Option<String> {
    match present(rec, key)? {
        Value::String(s) => Some(s.trim().to_string()),
        // Numbers, booleans and lists (e.g. OSM multi-valued `ref`) keep their
        // JSON text.
        v => Some(v.to_string()),
    }
}

pub fn tags_field(rec: &Record, key: &'static str) -> RowResult<Tags> {
    match present(rec, key) {
        None => Ok(Tags::new()),
        Some(Value::Object(map)) => Ok(map.clone().into_iter().collect()),
        Some(Value::String(s)) => parse_tag_blob(s).map_err(|e| RowError::malformed(key, e.to_string())),
        Some(v) => Err(RowError::malformed(key, format!("expected a tag map, got {v}"))),
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}
