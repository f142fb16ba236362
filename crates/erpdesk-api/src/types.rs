// Wire types shared by every list endpoint.
//
// Django-style pagination envelope, the bare-array "all" shape,
// and the `{errors: {...}}` validation envelope.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

// ── Pagination envelope ──────────────────────────────────────────────

/// One server page: `{results, count, next, previous}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Body of an unpaginated "all" query.
///
/// Some endpoints answer with a bare array, others still wrap it in a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged(Page<T>),
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    /// Normalise into a page. A bare array counts as one complete page.
    pub fn into_page(self) -> Page<T> {
        match self {
            Self::Paged(page) => page,
            Self::Bare(items) => Page {
                count: u64::try_from(items.len()).unwrap_or(u64::MAX),
                results: items,
                next: None,
                previous: None,
            },
        }
    }
}

// ── Query parameters ─────────────────────────────────────────────────

/// Query string for a list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub filters: IndexMap<String, String>,
}

impl ListQuery {
    /// Flatten into `(name, value)` pairs. Empty values are omitted.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 2);
        if let Some(page) = self.page {
            params.push(("page".to_owned(), page.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search".to_owned(), search.to_owned()));
        }
        params.extend(
            self.filters
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        params
    }

    /// Same search and filters, whatever the page.
    pub fn same_query(&self, other: &Self) -> bool {
        self.search.as_deref().unwrap_or_default() == other.search.as_deref().unwrap_or_default()
            && self.filters == other.filters
    }
}

// ── Validation envelope ──────────────────────────────────────────────

/// Field name to messages, in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(pub IndexMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut map = IndexMap::new();
        map.insert(field.into(), vec![message.into()]);
        Self(map)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First message for `field`.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|m| m.first()).map(String::as_str)
    }

    /// `"field: message"` for every message.
    pub fn flatten(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{field}: {m}")))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten().join("; "))
    }
}

/// A field's messages arrive either as a list or a single string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Messages {
    Many(Vec<String>),
    One(String),
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for FieldErrors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: IndexMap<String, Messages> = IndexMap::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(k, v)| {
                    let msgs = match v {
                        Messages::Many(m) => m,
                        Messages::One(m) => vec![m],
                        Messages::Other(other) => vec![other.to_string()],
                    };
                    (k, msgs)
                })
                .collect(),
        ))
    }
}

/// `{errors: {...}}` or a DRF `{detail: "..."}` body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Option<FieldErrors>,
    #[serde(default)]
    pub detail: Option<String>,
}
