//! Tabbed company editor overlay.
//!
//! Each tab keeps its own draft; switching tabs never discards one.
//! Tabs load lazily the first time they are shown and save one at a
//! time. Network work happens on the owning screen's tasks; this type
//! only tracks which tab is pending.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Span,
    widgets::Paragraph,
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use erpdesk_core::{CompanyTab, OptionsCache, TabbedSession};

use crate::screens::editor::{EditorEvent, FormEditor};
use crate::theme;
use crate::widgets::{popup, sub_tabs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Loading(CompanyTab),
    Saving(CompanyTab),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyEvent {
    Ignored,
    Handled,
    Changed(&'static str),
    /// The active tab has no data yet.
    Load(CompanyTab),
    Save,
    Close,
}

#[derive(Debug)]
pub struct CompanyEditor {
    tabs: TabbedSession,
    editor: FormEditor,
    pending: Option<Pending>,
}

impl CompanyEditor {
    pub fn new(tabs: TabbedSession) -> Self {
        let editor = FormEditor::new(tabs.active_session().clone());
        Self {
            tabs,
            editor,
            pending: None,
        }
    }

    pub fn active(&self) -> CompanyTab {
        self.tabs.active()
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub fn set_pending(&mut self, pending: Option<Pending>) {
        self.pending = pending;
        self.editor.set_saving(matches!(pending, Some(Pending::Saving(_))));
    }

    /// Snapshot for a background load or save, with the editor's
    /// draft written back into its tab.
    pub fn snapshot(&mut self) -> TabbedSession {
        self.sync();
        self.tabs.clone()
    }

    /// Take back a session returned by a background load or save.
    pub fn restore(&mut self, tabs: TabbedSession) {
        self.tabs = tabs;
        self.editor = FormEditor::new(self.tabs.active_session().clone());
        self.set_pending(None);
    }

    pub fn dirty_tabs(&self) -> Vec<CompanyTab> {
        let mut dirty = self.tabs.dirty_tabs();
        let active = self.tabs.active();
        if self.editor.session().is_dirty() && !dirty.contains(&active) {
            dirty.push(active);
        }
        dirty
    }

    fn sync(&mut self) {
        *self.tabs.active_session_mut() = self.editor.session().clone();
    }

    fn switch(&mut self, forward: bool) -> CompanyEvent {
        let all = CompanyTab::ALL;
        let at = all.iter().position(|&t| t == self.tabs.active()).unwrap_or(0);
        let next = if forward {
            (at + 1) % all.len()
        } else {
            (at + all.len() - 1) % all.len()
        };
        let Some(&tab) = all.get(next) else {
            return CompanyEvent::Ignored;
        };

        self.sync();
        self.tabs.switch(tab);
        self.editor = FormEditor::new(self.tabs.active_session().clone());
        if self.tabs.active_session().is_open() {
            CompanyEvent::Handled
        } else {
            CompanyEvent::Load(tab)
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, options: &OptionsCache) -> CompanyEvent {
        if self.pending.is_some() {
            return CompanyEvent::Ignored;
        }
        match key.code {
            KeyCode::PageDown => return self.switch(true),
            KeyCode::PageUp => return self.switch(false),
            _ => {}
        }
        if !self.editor.session().is_open() {
            return match key.code {
                KeyCode::Esc => CompanyEvent::Close,
                KeyCode::Char('r') => CompanyEvent::Load(self.tabs.active()),
                _ => CompanyEvent::Ignored,
            };
        }
        match self.editor.handle_key(key, options) {
            EditorEvent::Ignored => CompanyEvent::Ignored,
            EditorEvent::Moved => CompanyEvent::Handled,
            EditorEvent::Changed(key) => CompanyEvent::Changed(key),
            EditorEvent::Submit => CompanyEvent::Save,
            EditorEvent::Cancel => CompanyEvent::Close,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, options: &OptionsCache, throbber: &ThrobberState) {
        let title = format!("Company #{}", self.tabs.company());
        let height = self.editor.height().max(8) + 2;
        let dialog = popup::centered(area, 76, height);
        let inner = popup::frame(frame, dialog, &title, theme::border_focused());

        let [tab_line, hint_line, body] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);

        let labels: Vec<String> = CompanyTab::ALL.iter().map(ToString::to_string).collect();
        let active = CompanyTab::ALL
            .iter()
            .position(|&t| t == self.tabs.active())
            .unwrap_or(0);
        let dirty = self.dirty_tabs();
        let marked: Vec<usize> = CompanyTab::ALL
            .iter()
            .enumerate()
            .filter(|(_, t)| dirty.contains(t))
            .map(|(i, _)| i)
            .collect();
        frame.render_widget(
            Paragraph::new(sub_tabs::render_sub_tabs(&labels, active, &marked)),
            tab_line,
        );
        frame.render_widget(
            Paragraph::new(Span::styled("PgUp/PgDn switch tab", theme::key_hint())),
            hint_line,
        );

        match self.pending {
            Some(Pending::Loading(tab)) => {
                let spinner = Throbber::default()
                    .label(format!(" Loading {tab}..."))
                    .style(Style::default().fg(theme::NEON_CYAN))
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                frame.render_stateful_widget(spinner, body, &mut throbber.clone());
            }
            _ if !self.editor.session().is_open() => {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        "Not loaded. r retry  Esc close",
                        theme::key_hint(),
                    )),
                    body,
                );
            }
            _ => self.editor.render_body(frame, body, options, throbber),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use erpdesk_core::{Record, RecordId};

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded(tab: CompanyTab, fields: serde_json::Value) -> TabbedSession {
        let mut tabs = TabbedSession::new(RecordId::from("9"));
        tabs.switch(tab);
        let record = Record::try_from(fields).unwrap();
        tabs.session_mut(tab).open_update(std::sync::Arc::new(record));
        tabs
    }

    #[test]
    fn switching_to_an_unloaded_tab_asks_for_a_load() {
        let options = OptionsCache::new();
        let mut editor = CompanyEditor::new(loaded(CompanyTab::Company, json!({"id": 9})));
        assert_eq!(
            editor.handle_key(key(KeyCode::PageDown), &options),
            CompanyEvent::Load(CompanyTab::Bank)
        );
        assert_eq!(editor.active(), CompanyTab::Bank);
        assert_eq!(
            editor.handle_key(key(KeyCode::PageUp), &options),
            CompanyEvent::Handled
        );
    }

    #[test]
    fn drafts_survive_tab_switches() {
        let options = OptionsCache::new();
        let mut editor = CompanyEditor::new(loaded(CompanyTab::Company, json!({"id": 9, "name": "Acme"})));
        // "name" is the first field.
        assert_eq!(
            editor.handle_key(key(KeyCode::Char('!')), &options),
            CompanyEvent::Changed("name")
        );
        assert_eq!(editor.editor.value("name"), "Acme!");

        editor.handle_key(key(KeyCode::PageDown), &options);
        assert_eq!(editor.dirty_tabs(), vec![CompanyTab::Company]);
        editor.handle_key(key(KeyCode::PageUp), &options);
        assert_eq!(editor.editor.value("name"), "Acme!");
    }

    #[test]
    fn pending_work_blocks_input() {
        let options = OptionsCache::new();
        let mut editor = CompanyEditor::new(loaded(CompanyTab::Company, json!({"id": 9})));
        editor.set_pending(Some(Pending::Saving(CompanyTab::Company)));
        assert_eq!(
            editor.handle_key(key(KeyCode::PageDown), &options),
            CompanyEvent::Ignored
        );
        let tabs = editor.snapshot();
        editor.restore(tabs);
        assert_eq!(editor.pending(), None);
    }
}
