//! Schemaless documents and dotted field paths.

use serde_json::{Map, Value};

/// A stored document: opaque id plus JSON object data.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Document body (always a JSON object).
    pub data: Value,
}

impl Document {
    /// Creates a document.
    #[must_use]
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Looks up a dotted field path such as `processingResult.status`.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, path)
    }
}

/// Looks up a dotted field path inside a JSON value.
#[must_use]
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |value, segment| value.get(segment))
}

/// Writes `value` at a dotted field path, creating intermediate objects.
/// Non-object intermediates are replaced.
pub fn set_field(data: &mut Value, path: &str, value: Value) {
    let mut current = data;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Applies an update patch: every key is a dotted field path.
pub fn apply_patch(data: &mut Value, fields: Map<String, Value>) {
    for (path, value) in fields {
        set_field(data, &path, value);
    }
}
