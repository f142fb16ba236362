// ── Opaque backend record ──
//
// The list engine never interprets a record beyond its `id` and the
// handful of columns a view displays. Everything else is passed through
// to the edit session and back to the backend untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RecordId;

/// One backend entity (applicant, vendor, finished good, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.0.get("id").and_then(RecordId::from_json)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Display text for `field`. Dotted keys walk nested objects
    /// (`"brand.name"`); null or missing renders as an empty string.
    pub fn text(&self, field: &str) -> String {
        let mut parts = field.split('.');
        let Some(first) = parts.next() else {
            return String::new();
        };
        let mut current = self.0.get(first);
        for part in parts {
            current = current.and_then(|v| v.get(part));
        }
        current.map(display_value).unwrap_or_default()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Render a JSON value the way a table cell shows it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .get("name")
            .map_or_else(|| value.to_string(), display_value),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn text_renders_scalars_and_nulls() {
        let r = record(json!({"id": 7, "name": "Ravi", "gst": null, "active": true}));
        assert_eq!(r.text("name"), "Ravi");
        assert_eq!(r.text("id"), "7");
        assert_eq!(r.text("gst"), "");
        assert_eq!(r.text("missing"), "");
        assert_eq!(r.text("active"), "true");
        assert_eq!(r.id(), Some(RecordId::Number(7)));
    }

    #[test]
    fn text_walks_nested_objects() {
        let r = record(json!({"brand": {"id": 1, "name": "Glutape"}}));
        assert_eq!(r.text("brand.name"), "Glutape");
        assert_eq!(r.text("brand"), "Glutape");
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(Record::try_from(json!([1, 2])).is_err());
    }
}
