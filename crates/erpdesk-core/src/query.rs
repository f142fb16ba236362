// ── Query state ──
//
// Search text, filter selections and page number for one list.
// Changes are published on a watch channel; the fetch driver is the
// only subscriber that reacts to them.

use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::debug;

/// What the user has asked the list to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub search: String,
    /// Filter name to selected value. `None` means "any".
    pub filters: IndexMap<String, Option<String>>,
    /// 1-based page number.
    pub page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: IndexMap::new(),
            page: 1,
        }
    }
}

impl QueryState {
    /// Empty state with every named filter present and unset.
    pub fn with_filters<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            filters: names.into_iter().map(|n| (n.to_owned(), None)).collect(),
            ..Self::default()
        }
    }

    /// Selected filters only, in declaration order.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .filter(|(_, v)| !v.is_empty())
    }

    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters.get(name).and_then(Option::as_deref)
    }
}

/// Owner of one list's [`QueryState`].
///
/// `set_search` and `set_filter` always put the page back to 1.
/// `set_page` clamps into `1..=max(total_pages, 1)`.
#[derive(Debug)]
pub struct QueryController {
    tx: watch::Sender<QueryState>,
    initial: QueryState,
}

impl QueryController {
    pub fn new(initial: QueryState) -> Self {
        let (tx, _rx) = watch::channel(initial.clone());
        Self { tx, initial }
    }

    /// Receiver notified on every effective change.
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> QueryState {
        self.tx.borrow().clone()
    }

    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        self.tx.send_if_modified(|q| {
            if q.search == text && q.page == 1 {
                return false;
            }
            debug!(search = %text, "query search changed");
            q.search = text;
            q.page = 1;
            true
        });
    }

    pub fn set_filter(&self, name: &str, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());
        self.tx.send_if_modified(|q| {
            if q.filters.get(name) == Some(&value) && q.page == 1 {
                return false;
            }
            debug!(filter = name, value = ?value, "query filter changed");
            q.filters.insert(name.to_owned(), value);
            q.page = 1;
            true
        });
    }

    /// Move to page `n`, clamped into the valid range. Returns the page applied.
    pub fn set_page(&self, n: u32, total_pages: u32) -> u32 {
        let target = n.clamp(1, total_pages.max(1));
        self.tx.send_if_modified(|q| {
            if q.page == target {
                return false;
            }
            q.page = target;
            true
        });
        target
    }

    pub fn next_page(&self, total_pages: u32) -> u32 {
        let page = self.tx.borrow().page;
        self.set_page(page.saturating_add(1), total_pages)
    }

    pub fn prev_page(&self, total_pages: u32) -> u32 {
        let page = self.tx.borrow().page;
        self.set_page(page.saturating_sub(1), total_pages)
    }

    /// Back to the state the controller was created with.
    pub fn reset(&self) {
        let initial = QueryState {
            search: String::new(),
            filters: self.initial.filters.keys().map(|k| (k.clone(), None)).collect(),
            page: 1,
        };
        self.tx.send_if_modified(|q| {
            if *q == initial {
                return false;
            }
            *q = initial;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn controller() -> QueryController {
        QueryController::new(QueryState::with_filters(["stage", "status"]))
    }

    #[test]
    fn search_and_filter_changes_reset_page() {
        let q = controller();
        q.set_page(3, 5);
        assert_eq!(q.current().page, 3);

        q.set_search("ravi");
        assert_eq!(q.current().page, 1);

        q.set_page(2, 5);
        q.set_filter("stage", Some("Round1".into()));
        assert_eq!(q.current().page, 1);
        assert_eq!(q.current().filter("stage"), Some("Round1"));

        q.set_page(4, 5);
        q.set_filter("stage", None);
        assert_eq!(q.current().page, 1);
    }

    #[test]
    fn set_page_clamps_out_of_range() {
        let q = controller();
        assert_eq!(q.set_page(0, 2), 1);
        assert_eq!(q.set_page(9, 2), 2);
        assert_eq!(q.current().page, 2);
        // No pages yet: only page 1 is valid.
        assert_eq!(q.set_page(3, 0), 1);
    }

    #[test]
    fn reset_restores_defaults() {
        let q = controller();
        q.set_search("abc");
        q.set_filter("status", Some("Selected".into()));
        q.set_page(2, 3);
        q.reset();
        assert_eq!(q.current(), QueryState::with_filters(["stage", "status"]));
    }

    #[test]
    fn unchanged_values_do_not_notify() {
        let q = controller();
        let rx = q.subscribe();

        q.set_search("");
        q.set_filter("stage", None);
        q.set_page(1, 4);
        assert!(!rx.has_changed().unwrap_or(true));

        q.set_search("x");
        assert!(rx.has_changed().unwrap_or(false));
    }

    #[test]
    fn empty_filter_value_means_unset() {
        let q = controller();
        q.set_filter("status", Some(String::new()));
        assert_eq!(q.current().filter("status"), None);
        assert_eq!(q.current().active_filters().count(), 0);
    }
}
