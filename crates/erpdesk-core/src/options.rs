// ── Side-channel option lists ──
//
// Dropdown choices for filters and form fields. Each remote source is
// fetched on its own task, independent of the list fetch and of each
// other: a failed option fetch is logged and leaves the list alone.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::error::CoreError;
use crate::model::display_value;
use crate::resource::OptionSource;

/// One selectable choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionItem {
    /// Sent to the backend.
    pub value: String,
    pub label: String,
}

impl OptionItem {
    fn same(text: &str) -> Self {
        Self {
            value: text.to_owned(),
            label: text.to_owned(),
        }
    }
}

/// Loaded option lists, keyed by remote path.
///
/// Readers never block on a fetch: an unloaded source simply has no
/// choices yet. Every insert bumps a version subscribers can watch.
#[derive(Debug)]
pub struct OptionsCache {
    lists: DashMap<String, Arc<Vec<OptionItem>>>,
    version: watch::Sender<u64>,
}

impl Default for OptionsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsCache {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            lists: DashMap::new(),
            version,
        }
    }

    /// Choices currently known for `source`.
    pub fn options(&self, source: &OptionSource) -> Arc<Vec<OptionItem>> {
        match *source {
            OptionSource::Static(values) => {
                Arc::new(values.iter().map(|v| OptionItem::same(v)).collect())
            }
            OptionSource::Remote { path, .. } => self
                .lists
                .get(path)
                .map(|r| Arc::clone(r.value()))
                .unwrap_or_default(),
        }
    }

    pub fn is_loaded(&self, source: &OptionSource) -> bool {
        match source {
            OptionSource::Static(_) => true,
            OptionSource::Remote { path, .. } => self.lists.contains_key(*path),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn insert(&self, path: &str, items: Vec<OptionItem>) {
        self.lists.insert(path.to_owned(), Arc::new(items));
        self.version.send_modify(|v| *v += 1);
    }

    /// Fetch one remote source and store it. Static sources are a no-op.
    pub async fn load<B: Backend>(&self, backend: &B, source: &OptionSource) -> Result<usize, CoreError> {
        let OptionSource::Remote {
            path,
            value_key,
            label_key,
        } = *source
        else {
            return Ok(0);
        };

        let body = backend.get(path, &[]).await?;
        let items = parse_options(&body, value_key, label_key);
        let count = items.len();
        debug!(path, count, "options loaded");
        self.insert(path, items);
        Ok(count)
    }

    /// Load every remote source in `sources` on its own task.
    ///
    /// Failures are logged per source and never propagate.
    pub fn spawn_all<B: Backend>(
        self: &Arc<Self>,
        backend: &Arc<B>,
        sources: impl IntoIterator<Item = OptionSource>,
    ) -> Vec<JoinHandle<()>> {
        sources
            .into_iter()
            .filter(|s| matches!(s, OptionSource::Remote { .. }))
            .map(|source| {
                let cache = Arc::clone(self);
                let backend = Arc::clone(backend);
                tokio::spawn(async move {
                    if let Err(e) = cache.load(backend.as_ref(), &source).await {
                        if let OptionSource::Remote { path, .. } = source {
                            warn!(path, error = %e, "option list fetch failed");
                        }
                    }
                })
            })
            .collect()
    }
}

/// Rows may arrive bare or wrapped in a paginated envelope.
fn parse_options(body: &Value, value_key: &str, label_key: &str) -> Vec<OptionItem> {
    let rows = match body {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    rows.iter()
        .filter_map(|row| {
            let value = row.get(value_key).filter(|v| !v.is_null())?;
            let value = display_value(value);
            let label = row
                .get(label_key)
                .map(display_value)
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| value.clone());
            Some(OptionItem { value, label })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn null_values_are_dropped() {
        let body = json!([
            {"department": "Accounts"},
            {"department": null},
            {"department": "Sales"},
            {"other": 1},
        ]);
        let items = parse_options(&body, "department", "department");
        let values: Vec<_> = items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["Accounts", "Sales"]);
    }

    #[test]
    fn paged_envelope_and_label_fallback() {
        let body = json!({"count": 2, "results": [
            {"id": 3, "name": "Kg"},
            {"id": 4, "name": ""},
        ]});
        let items = parse_options(&body, "id", "name");
        assert_eq!(
            items,
            vec![
                OptionItem {
                    value: "3".into(),
                    label: "Kg".into()
                },
                OptionItem::same("4"),
            ]
        );
    }

    #[test]
    fn static_sources_need_no_fetch() {
        let cache = OptionsCache::new();
        let source = OptionSource::Static(&["today", "yesterday"]);
        assert!(cache.is_loaded(&source));
        assert_eq!(cache.options(&source).len(), 2);

        let remote = OptionSource::Remote {
            path: "api/x/",
            value_key: "id",
            label_key: "name",
        };
        assert!(!cache.is_loaded(&remote));
        assert!(cache.options(&remote).is_empty());

        let rx = cache.subscribe();
        cache.insert("api/x/", vec![OptionItem::same("1")]);
        assert!(cache.is_loaded(&remote));
        assert!(rx.has_changed().unwrap_or(false));
    }
}
