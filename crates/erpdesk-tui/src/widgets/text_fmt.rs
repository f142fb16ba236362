//! Text formatting for table cells and footers.

/// Cut `text` to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

/// Footer text like `page 2/5 · 112 records`.
pub fn pager(page: u32, total_pages: u32, total_count: u64) -> String {
    let noun = if total_count == 1 { "record" } else { "records" };
    format!("page {page}/{} · {total_count} {noun}", total_pages.max(1))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn truncate_marks_the_cut() {
        assert_eq!(truncate("Central Delhi", 20), "Central Delhi");
        assert_eq!(truncate("Central Delhi", 7), "Centra…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn pager_never_shows_page_zero() {
        assert_eq!(pager(1, 0, 0), "page 1/1 · 0 records");
        assert_eq!(pager(2, 3, 51), "page 2/3 · 51 records");
        assert_eq!(pager(1, 1, 1), "page 1/1 · 1 record");
    }
}
