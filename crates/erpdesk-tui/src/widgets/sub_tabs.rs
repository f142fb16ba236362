//! Horizontal sub-tab bar used inside screens (company editor tabs,
//! filter chips).

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::theme;

/// Renders labels inline with the active one bracketed and highlighted.
/// Labels in `marked` get a trailing `*` (unsaved changes).
pub fn render_sub_tabs<S: AsRef<str>>(labels: &[S], active_index: usize, marked: &[usize]) -> Line<'static> {
    let mut spans = Vec::with_capacity(labels.len() * 2);

    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }
        let label = label.as_ref();
        let mark = if marked.contains(&i) { "*" } else { "" };

        if i == active_index {
            spans.push(Span::styled(
                format!("[{label}{mark}]"),
                theme::tab_active().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(format!("{label}{mark}"), theme::tab_inactive()));
        }
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn active_tab_is_bracketed_and_dirty_tabs_marked() {
        let line = render_sub_tabs(&["Company", "Bank", "KYC"], 1, &[2]);
        assert_eq!(text(&line), "Company  [Bank]  KYC*");
    }
}
