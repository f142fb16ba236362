// ── Record identity ──
//
// Backend records are keyed by an integer primary key, a UUID, or a
// business key string (e.g. a lead id). RecordId unifies all three.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any backend record.
///
/// Variant order matters for `untagged` deserialization: numbers first,
/// then UUID-shaped strings, then anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Uuid(Uuid),
    Key(String),
}

impl RecordId {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Path segment used in `{endpoint}{id}/` URLs.
    pub fn path_segment(&self) -> String {
        self.to_string()
    }

    /// Extract an id from a JSON value, if it holds one.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(Self::Number),
            serde_json::Value::String(s) if !s.is_empty() => Some(Self::from(s.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Key(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        if let Ok(n) = s.parse::<u64>() {
            Self::Number(n)
        } else if let Ok(u) = Uuid::parse_str(s) {
            Self::Uuid(u)
        } else {
            Self::Key(s.to_owned())
        }
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_id_from_numeric_string() {
        let id: RecordId = "7".parse().unwrap();
        assert_eq!(id.as_number(), Some(7));
    }

    #[test]
    fn record_id_from_uuid_string() {
        let id = RecordId::from("550e8400-e29b-41d4-a716-446655440000");
        assert!(matches!(id, RecordId::Uuid(_)));
    }

    #[test]
    fn record_id_from_business_key() {
        let id = RecordId::from("LEAD-0042");
        assert_eq!(id, RecordId::Key("LEAD-0042".into()));
        assert_eq!(id.path_segment(), "LEAD-0042");
    }

    #[test]
    fn record_id_deserializes_number_or_string() {
        let n: RecordId = serde_json::from_str("12").unwrap();
        assert_eq!(n, RecordId::Number(12));
        let s: RecordId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(s, RecordId::Key("abc".into()));
    }
}
