//! Lenient readers for loosely-typed document fields.
//!
//! The webhook writer is not under our control: ids arrive as strings or
//! numbers and timestamps in several encodings. These helpers turn raw JSON
//! values into canonical Rust types and never fail loudly.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Parses a store timestamp.
///
/// Accepted encodings:
/// - RFC 3339 strings (`"2026-10-18T09:30:00Z"`)
/// - integer epoch milliseconds
/// - Firestore-style objects: `{ "_seconds", "_nanoseconds" }` or
///   `{ "seconds", "nanos" }`
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => {
            let seconds = map
                .get("_seconds")
                .or_else(|| map.get("seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("_nanoseconds")
                .or_else(|| map.get("nanoseconds"))
                .or_else(|| map.get("nanos"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
        }
        _ => None,
    }
}

/// Encodes a timestamp the way this service writes it: RFC 3339, UTC,
/// millisecond precision.
#[must_use]
pub fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Reads a string-or-number field as a string. Empty strings count as absent.
#[must_use]
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a string-or-number value at a JSON pointer.
#[must_use]
pub fn stringify_at(data: &Value, pointer: &str) -> Option<String> {
    data.pointer(pointer).and_then(stringify)
}

/// Reads a non-empty string at a JSON pointer. Other types count as absent.
#[must_use]
pub fn text_at(data: &Value, pointer: &str) -> Option<String> {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Reads a boolean at a JSON pointer.
#[must_use]
pub fn flag_at(data: &Value, pointer: &str) -> Option<bool> {
    data.pointer(pointer).and_then(Value::as_bool)
}

/// Reads a list of strings.
///
/// Arrays keep their stringifiable elements; a lone string becomes a
/// one-element list. Anything else reads as empty.
#[must_use]
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(stringify).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
