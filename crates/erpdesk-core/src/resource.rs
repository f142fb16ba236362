// ── Resource descriptors ──
//
// One static `Resource` per list page. Descriptors are data only;
// the controller, CLI and TUI all read the same ones from `catalog`.

use erpdesk_api::ListQuery;

use crate::form::FormSpec;
use crate::query::QueryState;

/// Where the choices of a filter or form field come from.
#[derive(Debug, Clone, Copy)]
pub enum OptionSource {
    Static(&'static [&'static str]),
    /// Fetched once from `path`; each row contributes `row[value_key]`
    /// labelled by `row[label_key]`. Rows with a null value are skipped.
    Remote {
        path: &'static str,
        value_key: &'static str,
        label_key: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    /// Query parameter name.
    pub key: &'static str,
    pub label: &'static str,
    pub source: OptionSource,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    /// Record field, dotted for nested values.
    pub key: &'static str,
}

/// How the search box reaches the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Sent to the backend as `search`.
    Server,
    /// Never sent to the backend. Substring-matched over `fields` of the
    /// page already loaded, so records on other pages are never found.
    LocalPage { fields: &'static [&'static str] },
    /// The list has no search box.
    Disabled,
}

#[derive(Debug)]
pub struct ExportSpec {
    pub columns: &'static [Column],
    /// Default file name without extension.
    pub file_stem: &'static str,
}

#[derive(Debug)]
pub struct Resource {
    /// CLI / config identifier, e.g. `applicants`.
    pub key: &'static str,
    pub title: &'static str,
    /// Collection path relative to the base URL, with trailing slash.
    pub endpoint: &'static str,
    /// `None` for lists the backend returns unpaginated.
    pub page_size: Option<u32>,
    pub search: SearchMode,
    pub filters: &'static [FilterSpec],
    pub columns: &'static [Column],
    pub export: Option<&'static ExportSpec>,
    pub form: Option<&'static FormSpec>,
    /// Extra option lists loaded alongside the list (form dropdowns).
    pub side_lists: &'static [(&'static str, OptionSource)],
}

impl Resource {
    pub fn is_paginated(&self) -> bool {
        self.page_size.is_some()
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().map(|f| f.key)
    }

    pub fn filter(&self, key: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.key == key)
    }

    pub fn initial_query(&self) -> QueryState {
        QueryState::with_filters(self.filter_names())
    }

    /// Backend query derived from `state`. Pure: same state, same request.
    pub fn request(&self, state: &QueryState) -> ListQuery {
        ListQuery {
            page: self.page_size.map(|_| state.page),
            search: match self.search {
                SearchMode::Server => Some(state.search.trim().to_owned()).filter(|s| !s.is_empty()),
                SearchMode::LocalPage { .. } | SearchMode::Disabled => None,
            },
            filters: state
                .active_filters()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }

    /// Same as [`request`](Self::request) with paging stripped, for exports.
    pub fn unpaginated_request(&self, state: &QueryState) -> ListQuery {
        ListQuery {
            page: None,
            ..self.request(state)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog;

    #[test]
    fn local_page_search_is_not_sent_to_backend() {
        let res = catalog::find("applicants").map(|r| r.search);
        assert!(matches!(res, Some(SearchMode::LocalPage { .. })));

        let applicants = &catalog::APPLICANTS;
        let mut state = applicants.initial_query();
        state.search = "ravi".into();
        state.filters.insert("stage".into(), Some("Round1".into()));

        let req = applicants.request(&state);
        assert_eq!(req.search, None);
        assert_eq!(req.page, Some(1));
        assert_eq!(req.filters.get("stage").map(String::as_str), Some("Round1"));
        assert!(req.filters.get("status").is_none());
    }

    #[test]
    fn server_search_is_sent() {
        let goods = &catalog::FINISHED_GOODS;
        let mut state = goods.initial_query();
        state.search = " tape ".into();
        state.page = 3;
        let req = goods.request(&state);
        assert_eq!(req.search.as_deref(), Some("tape"));
        assert_eq!(req.page, Some(3));
    }

    #[test]
    fn unpaginated_lists_send_no_page() {
        let mrf = &catalog::MRF_PRODUCTS;
        let mut state = mrf.initial_query();
        state.filters.insert("filter_by".into(), Some("today".into()));
        let req = mrf.request(&state);
        assert_eq!(req.page, None);
        assert_eq!(req.to_params(), vec![("filter_by".to_owned(), "today".to_owned())]);
    }
}
