//! Centered overlay areas.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Block, BorderType, Borders, Clear},
};

use crate::theme;

/// Rect of at most `width`×`height` centered in `area`, leaving a margin.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    Rect::new(area.x + x, area.y + y, width, height)
}

/// Clear `area`, draw a titled rounded frame and return its inner rect.
pub fn frame(frame: &mut Frame, area: Rect, title: &str, border: Style) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_inside_small_areas() {
        let area = Rect::new(0, 0, 40, 10);
        let r = centered(area, 100, 100);
        assert!(r.width <= 36 && r.height <= 8);
        assert_eq!(r.x, (40 - r.width) / 2);

        let r = centered(Rect::new(10, 5, 80, 24), 40, 6);
        assert_eq!((r.x, r.y, r.width, r.height), (30, 14, 40, 6));
    }
}
