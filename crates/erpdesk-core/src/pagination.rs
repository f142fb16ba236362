// ── Result sets and pagination math ──

use erpdesk_api::Page;

use crate::model::Record;

/// Records per server page for every list.
pub const PAGE_SIZE: u32 = 25;

/// `ceil(count / page_size)`; zero records means zero pages.
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// The page of records currently displayed plus its count metadata.
///
/// Replaced wholesale on every applied fetch, never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub items: Vec<Record>,
    pub total_count: u64,
    pub page_size: u32,
    pub page: u32,
}

impl ResultSet {
    pub fn from_page(page: Page<Record>, number: u32, page_size: u32) -> Self {
        Self {
            items: page.results,
            total_count: page.count,
            page_size,
            page: number,
        }
    }

    /// An unpaginated list treated as a single page.
    pub fn single(items: Vec<Record>) -> Self {
        let len = u64::try_from(items.len()).unwrap_or(u64::MAX);
        let page_size = u32::try_from(items.len()).unwrap_or(u32::MAX).max(1);
        Self {
            items,
            total_count: len,
            page_size,
            page: 1,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What the view should draw for a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// First fetch in flight, nothing to show yet.
    Loading,
    /// A fetch completed with zero records.
    Empty,
    Ready,
    /// First fetch failed and there is nothing to fall back to.
    Failed,
}

/// Case-insensitive substring match over `fields` of the given items.
///
/// Only ever sees the items handed in (the loaded page), never the
/// full dataset. An empty needle matches everything.
pub fn local_filter<'a>(items: &'a [Record], needle: &str, fields: &[&str]) -> Vec<&'a Record> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|r| {
            fields
                .iter()
                .any(|f| r.text(f).to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn applicant(id: u64, name: &str, email: &str, job: &str) -> Record {
        Record::try_from(json!({"id": id, "name": name, "email": email, "job": job})).unwrap()
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 25), 0);
        assert_eq!(total_pages(1, 25), 1);
        assert_eq!(total_pages(25, 25), 1);
        assert_eq!(total_pages(26, 25), 2);
        assert_eq!(total_pages(40, 25), 2);
        assert_eq!(total_pages(1000, 25), 40);
    }

    #[test]
    fn total_pages_matches_ceil_division() {
        for count in 0..=200_u64 {
            for size in 1..=30_u32 {
                let size64 = u64::from(size);
                let expected = count / size64 + u64::from(count % size64 != 0);
                assert_eq!(u64::from(total_pages(count, size)), expected);
            }
        }
    }

    #[test]
    fn local_filter_matches_any_field_case_insensitively() {
        let items = vec![
            applicant(1, "Ravi Kumar", "ravi@x.in", "Accountant"),
            applicant(2, "Meera", "meera@y.in", "Sales Executive"),
            applicant(3, "John", "john@z.in", "Sales Manager"),
        ];
        let fields = ["name", "email", "job"];

        let hits = local_filter(&items, "SALES", &fields);
        assert_eq!(hits.len(), 2);

        let hits = local_filter(&items, "ravi@", &fields);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id().unwrap().to_string(), "1");

        assert_eq!(local_filter(&items, "  ", &fields).len(), 3);
        assert!(local_filter(&items, "zzz", &fields).is_empty());
    }

    #[test]
    fn single_page_result_set() {
        let rs = ResultSet::single(vec![]);
        assert_eq!(rs.total_pages(), 0);
        assert!(rs.is_empty());
    }
}
