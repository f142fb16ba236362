//! Edit overlay: one form, one field under the cursor.
//!
//! Text-like fields take typed characters; choice fields cycle through
//! their option list with ←/→. Every change goes through
//! [`EditSession::set_field`] so derived rules apply immediately.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use serde_json::Value;
use throbber_widgets_tui::{Throbber, ThrobberState};

use erpdesk_core::model::display_value;
use erpdesk_core::{EditMode, EditSession, FieldKind, FieldSpec, OptionsCache};

use crate::theme;
use crate::widgets::{popup, text_fmt};

/// What a key press did to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    Ignored,
    Moved,
    Changed(&'static str),
    Submit,
    Cancel,
}

#[derive(Debug)]
pub struct FormEditor {
    session: EditSession,
    cursor: usize,
    saving: bool,
}

impl FormEditor {
    pub fn new(session: EditSession) -> Self {
        Self {
            session,
            cursor: 0,
            saving: false,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Put back the session a background save returned.
    pub fn restore(&mut self, session: EditSession) {
        self.session = session;
        self.saving = false;
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn set_saving(&mut self, saving: bool) {
        self.saving = saving;
    }

    fn fields(&self) -> &'static [FieldSpec] {
        self.session.form().fields
    }

    fn current(&self) -> Option<&'static FieldSpec> {
        self.fields().get(self.cursor)
    }

    pub fn value(&self, key: &str) -> String {
        self.session
            .draft()
            .and_then(|d| d.get(key))
            .map(display_value)
            .unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent, options: &OptionsCache) -> EditorEvent {
        if self.saving {
            return EditorEvent::Ignored;
        }
        let count = self.fields().len();
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => EditorEvent::Cancel,
            (_, KeyCode::Enter) | (KeyModifiers::CONTROL, KeyCode::Char('s')) => EditorEvent::Submit,
            (_, KeyCode::Tab | KeyCode::Down) if count > 0 => {
                self.cursor = (self.cursor + 1) % count;
                EditorEvent::Moved
            }
            (_, KeyCode::BackTab | KeyCode::Up) if count > 0 => {
                self.cursor = (self.cursor + count - 1) % count;
                EditorEvent::Moved
            }
            (_, code) => self.edit_current(code, options),
        }
    }

    fn edit_current(&mut self, code: KeyCode, options: &OptionsCache) -> EditorEvent {
        let Some(field) = self.current() else {
            return EditorEvent::Ignored;
        };
        let current = self.value(field.key);

        let next = match (field.kind, code) {
            (FieldKind::Choice(source), KeyCode::Left | KeyCode::Right) => {
                let choices = options.options(&source);
                // Position 0 is "no value".
                let len = choices.len() + 1;
                let at = choices
                    .iter()
                    .position(|o| o.value == current)
                    .map_or(0, |i| i + 1);
                let step = if code == KeyCode::Right { 1 } else { len - 1 };
                match (at + step) % len {
                    0 => String::new(),
                    i => choices.get(i - 1).map(|o| o.value.clone()).unwrap_or_default(),
                }
            }
            (FieldKind::Choice(_), _) => return EditorEvent::Ignored,
            (_, KeyCode::Backspace) => {
                let mut s = current;
                s.pop();
                s
            }
            (kind, KeyCode::Char(c)) if accepts(kind, c) => {
                let mut s = current;
                s.push(c);
                s
            }
            _ => return EditorEvent::Ignored,
        };

        if self.session.set_field(field.key, Value::String(next)).is_err() {
            return EditorEvent::Ignored;
        }
        EditorEvent::Changed(field.key)
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect, options: &OptionsCache, throbber: &ThrobberState) {
        let form = self.session.form();
        let title = match self.session.mode() {
            Some(EditMode::Update(record)) => match record.id() {
                Some(id) => format!("Edit {} #{id}", form.title),
                None => format!("Edit {}", form.title),
            },
            _ => format!("New {}", form.title),
        };

        let dialog = popup::centered(area, 72, self.height());
        let inner = popup::frame(frame, dialog, &title, theme::border_focused());
        self.render_body(frame, inner, options, throbber);
    }

    /// Rows the form wants: a value line and an error line per field,
    /// plus the footer and frame.
    pub fn height(&self) -> u16 {
        u16::try_from(self.fields().len() * 2 + 3).unwrap_or(u16::MAX)
    }

    /// Fields and footer, without a surrounding frame.
    pub fn render_body(&self, frame: &mut Frame, inner: Rect, options: &OptionsCache, throbber: &ThrobberState) {
        let form = self.session.form();
        let [body, footer] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        let errors = self.session.field_errors();
        let value_width = usize::from(body.width.saturating_sub(24));
        let mut lines = Vec::with_capacity(form.fields.len() * 2);
        for (i, field) in form.fields.iter().enumerate() {
            let focused = i == self.cursor;
            let marker = if focused { "▸ " } else { "  " };
            let mut value = self.value(field.key);
            if let FieldKind::Choice(source) = field.kind {
                let label = options
                    .options(&source)
                    .iter()
                    .find(|o| o.value == value)
                    .map(|o| o.label.clone());
                value = format!("◂ {} ▸", label.unwrap_or(value));
            } else if focused {
                value.push('█');
            }

            let value_style = if is_derived(form.derived, field.key, self) {
                theme::derived_value()
            } else {
                theme::table_row()
            };
            lines.push(Line::from(vec![
                Span::styled(marker, theme::field_label(focused)),
                Span::styled(format!("{:<20}", field.label), theme::field_label(focused)),
                Span::styled(text_fmt::truncate(&value, value_width), value_style),
            ]));

            let message = errors.and_then(|e| e.first(field.key)).unwrap_or_default();
            lines.push(Line::from(Span::styled(
                format!("{:24}{message}", ""),
                theme::field_error(),
            )));
        }
        // Keep the focused field (and its error line) in view.
        let bottom = u16::try_from(self.cursor * 2 + 2).unwrap_or(u16::MAX);
        let scroll = bottom.saturating_sub(body.height);
        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), body);

        if self.saving {
            let spinner = Throbber::default()
                .label(" Saving...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(spinner, footer, &mut throbber.clone());
        } else {
            let dirty = if self.session.is_dirty() { "  · modified" } else { "" };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("Tab/↑↓ ", theme::key_hint_key()),
                    Span::styled("field  ", theme::key_hint()),
                    Span::styled("←/→ ", theme::key_hint_key()),
                    Span::styled("choose  ", theme::key_hint()),
                    Span::styled("Enter ", theme::key_hint_key()),
                    Span::styled("save  ", theme::key_hint()),
                    Span::styled("Esc ", theme::key_hint_key()),
                    Span::styled("cancel", theme::key_hint()),
                    Span::styled(dirty, Style::default().fg(theme::ELECTRIC_YELLOW)),
                ])),
                footer,
            );
        }
    }
}

/// Characters a text-like field accepts.
fn accepts(kind: FieldKind, c: char) -> bool {
    match kind {
        FieldKind::Text => !c.is_control(),
        FieldKind::Number => c.is_ascii_digit() || c == '.' || c == '-',
        FieldKind::Date => c.is_ascii_digit() || c == '-',
        FieldKind::Choice(_) => false,
    }
}

/// Whether `key` is currently held by a derived rule (shown in a
/// different color so the pin is visible).
fn is_derived(rules: &[erpdesk_core::form::DerivedRule], key: &str, editor: &FormEditor) -> bool {
    use erpdesk_core::form::DerivedRule;
    rules.iter().any(|rule| match *rule {
        DerivedRule::PinWhen {
            trigger,
            equals,
            target,
            ..
        } => target == key && editor.value(trigger) == equals,
        DerivedRule::ClearOnSwitch { .. } => false,
    })
}
