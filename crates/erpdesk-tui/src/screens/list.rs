//! List screen: one catalog resource as a paged table.
//!
//! The controller owns the query and the results; this screen mirrors
//! what the bridge forwards, turns keys into query changes, and runs
//! saves, tab loads and exports on spawned tasks that report back as
//! actions.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use erpdesk_core::{
    CompanyTab, ErpClient, ExportJob, ListController, PostalAutofill, PostalClient, PostalFill,
    Record, ResultState, SearchMode, TabbedSession, ViewState, fill_session,
};

use crate::action::{Action, Notification, SaveReport};
use crate::component::Component;
use crate::data_bridge::run_list_bridge;
use crate::screen::ScreenId;
use crate::screens::company::{CompanyEditor, CompanyEvent, Pending};
use crate::screens::editor::{EditorEvent, FormEditor};
use crate::theme;
use crate::widgets::text_fmt;

enum Overlay {
    Form(FormEditor),
    Company(CompanyEditor),
}

pub struct ListScreen {
    id: ScreenId,
    controller: ListController<ErpClient>,
    /// Present only for forms with a pincode and a vendor type.
    autofill: Option<PostalAutofill<PostalClient>>,
    /// Handed to the bridge when it starts.
    postal_rx: Option<mpsc::UnboundedReceiver<PostalFill>>,
    action_tx: Option<UnboundedSender<Action>>,
    cancel: CancellationToken,
    started: bool,
    focused: bool,
    results: ResultState,
    items: Vec<Record>,
    table_state: TableState,
    busy: bool,
    /// Last fetch error already sent to the error queue.
    last_error: Option<String>,
    /// Index into the resource's filters while the filter bar has focus.
    filter_cursor: Option<usize>,
    overlay: Option<Overlay>,
    throbber: ThrobberState,
    exporting: bool,
}

impl ListScreen {
    pub fn new(
        id: ScreenId,
        controller: ListController<ErpClient>,
        postal: Option<Arc<PostalClient>>,
    ) -> Self {
        let wants_autofill = controller
            .resource()
            .form
            .is_some_and(|f| f.field("pincode").is_some() && f.field("type").is_some());
        let (autofill, postal_rx) = match postal.filter(|_| wants_autofill) {
            Some(lookup) => {
                let (autofill, rx) = PostalAutofill::new(lookup);
                (Some(autofill), Some(rx))
            }
            None => (None, None),
        };

        Self {
            id,
            controller,
            autofill,
            postal_rx,
            action_tx: None,
            cancel: CancellationToken::new(),
            started: false,
            focused: false,
            results: ResultState::default(),
            items: Vec::new(),
            table_state: TableState::default(),
            busy: false,
            last_error: None,
            filter_cursor: None,
            overlay: None,
            throbber: ThrobberState::default(),
            exporting: false,
        }
    }

    fn start_bridge(&mut self) {
        if self.started {
            return;
        }
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        self.started = true;
        info!(screen = %self.id, "starting list bridge");
        tokio::spawn(run_list_bridge(
            self.id,
            self.controller.clone(),
            self.postal_rx.take(),
            tx,
            self.cancel.clone(),
        ));
    }

    // ── Selection ────────────────────────────────────────────────────

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn select(&mut self, idx: usize) {
        let clamped = idx.min(self.items.len().saturating_sub(1));
        self.table_state.select(Some(clamped));
    }

    fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let next = self.selected_index().saturating_add_signed(delta);
        self.select(next);
    }

    fn refresh_items(&mut self) {
        self.items = self.controller.visible_items();
        self.select(self.selected_index());
    }

    fn apply_results(&mut self, state: ResultState) -> Option<Action> {
        let fresh_error = state
            .error
            .clone()
            .filter(|e| self.last_error.as_ref() != Some(e));
        self.last_error.clone_from(&state.error);
        self.results = state;
        self.refresh_items();
        fresh_error.map(|e| Action::ReportErrors(vec![e]))
    }

    // ── Filters ──────────────────────────────────────────────────────

    fn handle_filter_key(&mut self, cursor: usize, key: KeyEvent) -> Option<Action> {
        let filters = self.controller.resource().filters;
        let count = filters.len();
        let spec = filters.get(cursor)?;

        let value = match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.filter_cursor = None;
                return None;
            }
            KeyCode::Tab | KeyCode::Down => {
                self.filter_cursor = Some((cursor + 1) % count);
                return None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.filter_cursor = Some((cursor + count - 1) % count);
                return None;
            }
            KeyCode::Backspace | KeyCode::Delete => None,
            code @ (KeyCode::Left | KeyCode::Right) => {
                let choices = self.controller.options().options(&spec.source);
                let query = self.controller.query();
                // Position 0 is "any".
                let len = choices.len() + 1;
                let at = query
                    .filter(spec.key)
                    .and_then(|v| choices.iter().position(|o| o.value == v))
                    .map_or(0, |i| i + 1);
                let step = if code == KeyCode::Right { 1 } else { len - 1 };
                match (at + step) % len {
                    0 => None,
                    i => choices.get(i - 1).map(|o| o.value.clone()),
                }
            }
            _ => return None,
        };

        match self.controller.set_filter(spec.key, value) {
            Ok(()) => None,
            Err(e) => Some(Action::ReportErrors(e.field_messages())),
        }
    }

    // ── Editing ──────────────────────────────────────────────────────

    fn open_create(&mut self) -> Option<Action> {
        let resource = self.controller.resource();
        if resource.form.is_none() {
            return Some(Action::Notify(Notification::info(format!(
                "{} is read-only",
                resource.title
            ))));
        }
        match self.controller.new_record() {
            Ok(session) => {
                self.overlay = Some(Overlay::Form(FormEditor::new(session)));
                None
            }
            Err(e) => Some(Action::ReportErrors(e.field_messages())),
        }
    }

    fn open_selected(&mut self) -> Option<Action> {
        let record = self.items.get(self.selected_index())?.clone();

        if self.id == ScreenId::Companies {
            let Some(company) = record.id() else {
                return Some(Action::ReportErrors(vec!["record has no id".into()]));
            };
            let editor = CompanyEditor::new(TabbedSession::new(company));
            self.overlay = Some(Overlay::Company(editor));
            self.load_company_tab(CompanyTab::Company);
            return None;
        }

        if self.controller.resource().form.is_none() {
            return None;
        }
        match self.controller.editor() {
            Ok(mut session) => {
                session.open_update(Arc::new(record));
                self.overlay = Some(Overlay::Form(FormEditor::new(session)));
                None
            }
            Err(e) => Some(Action::ReportErrors(e.field_messages())),
        }
    }

    fn close_overlay(&mut self) {
        if let Some(autofill) = self.autofill.as_mut() {
            autofill.cancel();
        }
        self.overlay = None;
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> Option<Action> {
        let options = Arc::clone(self.controller.options());
        match self.overlay.as_mut()? {
            Overlay::Form(editor) => match editor.handle_key(key, &options) {
                EditorEvent::Submit => self.submit_form(),
                EditorEvent::Cancel => self.close_overlay(),
                EditorEvent::Changed("pincode") => {
                    let pin = editor.value("pincode");
                    if let Some(autofill) = self.autofill.as_mut() {
                        autofill.pincode_changed(&pin);
                    }
                }
                EditorEvent::Changed(_) | EditorEvent::Moved | EditorEvent::Ignored => {}
            },
            Overlay::Company(editor) => match editor.handle_key(key, &options) {
                CompanyEvent::Load(tab) => self.load_company_tab(tab),
                CompanyEvent::Save => self.save_company_tab(),
                CompanyEvent::Close => self.close_overlay(),
                CompanyEvent::Changed(_) | CompanyEvent::Handled | CompanyEvent::Ignored => {}
            },
        }
        None
    }

    fn submit_form(&mut self) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let Some(Overlay::Form(editor)) = &mut self.overlay else {
            return;
        };
        editor.set_saving(true);
        let mut session = editor.session().clone();
        let controller = self.controller.clone();
        let id = self.id;

        tokio::spawn(async move {
            let outcome = match controller.save(&mut session).await {
                Ok(saved) if saved.created => Ok("Record created".to_owned()),
                Ok(_) => Ok("Changes saved".to_owned()),
                Err(e) => Err(e.field_messages()),
            };
            let report = SaveReport {
                session: Box::new(session),
                outcome,
            };
            let _ = tx.send(Action::EditSaved(id, report));
        });
    }

    fn finish_save(&mut self, report: &SaveReport<erpdesk_core::EditSession>) -> Option<Action> {
        let Some(Overlay::Form(editor)) = &mut self.overlay else {
            return None;
        };
        match &report.outcome {
            Ok(message) => {
                self.overlay = None;
                Some(Action::Notify(Notification::success(message.clone())))
            }
            Err(messages) => {
                editor.restore((*report.session).clone());
                Some(Action::ReportErrors(messages.clone()))
            }
        }
    }

    fn load_company_tab(&mut self, tab: CompanyTab) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let Some(Overlay::Company(editor)) = &mut self.overlay else {
            return;
        };
        editor.set_pending(Some(Pending::Loading(tab)));
        let mut tabs = editor.snapshot();
        let backend = Arc::clone(self.controller.backend());
        let id = self.id;

        tokio::spawn(async move {
            let errors = tabs
                .load(backend.as_ref(), tab)
                .await
                .err()
                .map(|e| e.field_messages());
            let _ = tx.send(Action::CompanyLoaded(id, Box::new(tabs), errors));
        });
    }

    fn save_company_tab(&mut self) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let Some(Overlay::Company(editor)) = &mut self.overlay else {
            return;
        };
        let tab = editor.active();
        editor.set_pending(Some(Pending::Saving(tab)));
        let mut tabs = editor.snapshot();
        let backend = Arc::clone(self.controller.backend());
        let id = self.id;

        tokio::spawn(async move {
            let outcome = tabs
                .save_active(backend.as_ref())
                .await
                .map(|_| format!("{tab} saved"))
                .map_err(|e| e.field_messages());
            let report = SaveReport {
                session: Box::new(tabs),
                outcome,
            };
            let _ = tx.send(Action::CompanySaved(id, report));
        });
    }

    fn finish_company_save(&mut self, report: &SaveReport<TabbedSession>) -> Option<Action> {
        let Some(Overlay::Company(editor)) = &mut self.overlay else {
            return None;
        };
        editor.restore((*report.session).clone());
        match &report.outcome {
            Ok(message) => {
                // The saved tab closed; show what the backend now holds.
                let tab = editor.active();
                self.controller.refresh();
                self.load_company_tab(tab);
                Some(Action::Notify(Notification::success(message.clone())))
            }
            Err(messages) => Some(Action::ReportErrors(messages.clone())),
        }
    }

    // ── Export ───────────────────────────────────────────────────────

    fn start_export(&mut self) -> Option<Action> {
        if self.exporting {
            return None;
        }
        let tx = self.action_tx.clone()?;
        let job = ExportJob::new(self.controller.resource(), &self.controller.query());
        let file_name = job.default_file_name();
        let dest = PathBuf::from(&file_name);
        self.exporting = true;
        let controller = self.controller.clone();
        let id = self.id;

        tokio::spawn(async move {
            let outcome = controller
                .export(&dest)
                .await
                .map(|summary| (summary.rows, summary.path))
                .map_err(|e| e.field_messages());
            let _ = tx.send(Action::ExportFinished(id, outcome));
        });
        Some(Action::Notify(Notification::info(format!("Exporting {file_name}..."))))
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn query_line(&self) -> Line<'static> {
        let resource = self.controller.resource();
        let query = self.controller.query();
        let mut spans = Vec::new();

        if resource.search != SearchMode::Disabled {
            let text = if query.search.is_empty() {
                "-".to_owned()
            } else {
                query.search.clone()
            };
            spans.push(Span::styled(" Search ", theme::field_label(false)));
            spans.push(Span::styled(text, Style::default().fg(theme::NEON_CYAN)));
            spans.push(Span::raw("   "));
        }

        for (i, spec) in resource.filters.iter().enumerate() {
            let focused = self.filter_cursor == Some(i);
            let value = query.filter(spec.key).unwrap_or("any");
            let label = self
                .controller
                .options()
                .options(&spec.source)
                .iter()
                .find(|o| o.value == value)
                .map_or_else(|| value.to_owned(), |o| o.label.clone());
            let value_style = if focused {
                Style::default().fg(theme::NEON_CYAN).add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(theme::CORAL)
            };
            spans.push(Span::styled(format!(" {} ", spec.label), theme::field_label(focused)));
            spans.push(Span::styled(label, value_style));
            spans.push(Span::raw("  "));
        }
        Line::from(spans)
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let columns = self.controller.resource().columns;
        let count = u16::try_from(columns.len().max(1)).unwrap_or(1);
        let cell_width = usize::from(area.width / count).saturating_sub(1);

        let header = Row::new(
            columns
                .iter()
                .map(|c| Cell::from(c.header).style(theme::table_header())),
        );

        let selected_idx = self.selected_index();
        let rows: Vec<Row> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let style = if i == selected_idx && self.focused {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                Row::new(
                    columns
                        .iter()
                        .map(|c| Cell::from(text_fmt::truncate(&record.text(c.key), cell_width))),
                )
                .style(style)
            })
            .collect();

        let widths = vec![Constraint::Fill(1); columns.len()];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn footer_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        if let Some(result) = &self.results.result {
            spans.push(Span::styled(
                format!(
                    " {}",
                    text_fmt::pager(result.page, result.total_pages(), result.total_count)
                ),
                Style::default().fg(theme::DIM_WHITE),
            ));
        }
        if matches!(self.controller.resource().search, SearchMode::LocalPage { .. })
            && !self.controller.query().search.is_empty()
        {
            spans.push(Span::styled(
                "  · search covers this page only",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }
        if self.exporting {
            spans.push(Span::styled("  · exporting", Style::default().fg(theme::ELECTRIC_PURPLE)));
        }
        if self.filter_cursor.is_some() {
            spans.push(Span::styled(
                "  ←/→ value  Tab next  Bksp clear  Enter done",
                theme::key_hint(),
            ));
        }
        Line::from(spans)
    }
}

impl Component for ListScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        if self.focused {
            self.start_bridge();
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.overlay.is_some() {
            return Ok(self.handle_overlay_key(key));
        }
        if let Some(cursor) = self.filter_cursor {
            return Ok(self.handle_filter_key(cursor, key));
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') => self.select(0),
            KeyCode::Char('G') => self.select(self.items.len().saturating_sub(1)),
            KeyCode::Char('n') | KeyCode::Right => {
                self.controller.next_page();
            }
            KeyCode::Char('p') | KeyCode::Left => {
                self.controller.prev_page();
            }
            KeyCode::Char('r') => self.controller.refresh(),
            KeyCode::Char('f') if !self.controller.resource().filters.is_empty() => {
                self.filter_cursor = Some(0);
            }
            KeyCode::Char('c') => return Ok(self.open_create()),
            KeyCode::Char('e') | KeyCode::Enter => return Ok(self.open_selected()),
            KeyCode::Char('x') => return Ok(self.start_export()),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        let me = self.id;
        let mine = |id: &ScreenId| *id == me;
        match action {
            Action::Tick => {
                let pending = match &self.overlay {
                    Some(Overlay::Form(editor)) => editor.is_saving(),
                    Some(Overlay::Company(editor)) => editor.pending().is_some(),
                    None => false,
                };
                if self.busy || self.exporting || pending {
                    self.throbber.calc_next();
                }
            }
            Action::ResultsUpdated(id, state) if mine(id) => {
                return Ok(self.apply_results(state.clone()));
            }
            Action::BusyChanged(id, busy) if mine(id) => self.busy = *busy,
            Action::PostalResolved(id, fill) if mine(id) => {
                if let Some(Overlay::Form(editor)) = &mut self.overlay {
                    if fill_session(editor.session_mut(), fill) {
                        debug!(pincode = %fill.pincode, "address filled from pincode");
                    }
                }
            }
            // Page-local search narrows as the user types.
            Action::SearchInput(text)
                if self.focused
                    && matches!(self.controller.resource().search, SearchMode::LocalPage { .. }) =>
            {
                if self.controller.set_search(text.clone()).is_ok() {
                    self.refresh_items();
                }
            }
            Action::SearchSubmit(text) if self.focused => {
                if let Err(e) = self.controller.set_search(text.clone()) {
                    return Ok(Some(Action::ReportErrors(e.field_messages())));
                }
                self.refresh_items();
            }
            Action::EditSaved(id, report) if mine(id) => return Ok(self.finish_save(report)),
            Action::CompanyLoaded(id, tabs, errors) if mine(id) => {
                if let Some(Overlay::Company(editor)) = &mut self.overlay {
                    editor.restore((**tabs).clone());
                }
                return Ok(errors.clone().map(Action::ReportErrors));
            }
            Action::CompanySaved(id, report) if mine(id) => {
                return Ok(self.finish_company_save(report));
            }
            Action::ExportFinished(id, outcome) if mine(id) => {
                self.exporting = false;
                return Ok(Some(match outcome {
                    Ok((rows, path)) => Action::Notify(Notification::success(format!(
                        "Exported {rows} rows to {}",
                        path.display()
                    ))),
                    Err(messages) => Action::ReportErrors(messages.clone()),
                }));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let resource = self.controller.resource();
        let block = Block::default()
            .title(format!(" {} ", resource.title))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [bar, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(self.query_line()), bar);

        match self.results.view() {
            ViewState::Loading => {
                let spinner = Throbber::default()
                    .label(format!(" Loading {}...", resource.title))
                    .style(Style::default().fg(theme::NEON_CYAN))
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                frame.render_stateful_widget(spinner, body, &mut self.throbber.clone());
            }
            ViewState::Empty => {
                frame.render_widget(
                    Paragraph::new(Span::styled(" No records", theme::key_hint())),
                    body,
                );
            }
            ViewState::Failed => {
                let message = self.results.error.clone().unwrap_or_default();
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::from(Span::styled(format!(" {message}"), theme::field_error())),
                        Line::from(vec![
                            Span::styled(" r ", theme::key_hint_key()),
                            Span::styled("retry", theme::key_hint()),
                        ]),
                    ]),
                    body,
                );
            }
            ViewState::Ready => self.render_table(frame, body),
        }

        frame.render_widget(Paragraph::new(self.footer_line()), footer);

        let options = self.controller.options();
        match &self.overlay {
            Some(Overlay::Form(editor)) => editor.render(frame, area, options, &self.throbber),
            Some(Overlay::Company(editor)) => editor.render(frame, area, options, &self.throbber),
            None => {}
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused {
            self.start_bridge();
        }
    }

    fn captures_input(&self) -> bool {
        self.overlay.is_some() || self.filter_cursor.is_some()
    }

    fn key_hints(&self) -> &'static str {
        "j/k move  n/p page  f filter  r refresh  c new  e edit  x export"
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(autofill) = self.autofill.as_mut() {
            autofill.cancel();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use erpdesk_core::{Session, TransportConfig};

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(id: ScreenId) -> ListScreen {
        let client = ErpClient::new("http://127.0.0.1:9/", None, &TransportConfig::default()).unwrap();
        let controller = ListController::new(id.resource(), Arc::new(client), Session::anonymous());
        ListScreen::new(id, controller, None)
    }

    #[test]
    fn filter_bar_cycles_static_values() {
        let mut s = screen(ScreenId::MrfProducts);
        s.handle_key_event(key(KeyCode::Char('f'))).unwrap();
        assert!(s.captures_input());

        s.handle_key_event(key(KeyCode::Right)).unwrap();
        assert_eq!(s.controller.query().filter("filter_by"), Some("today"));
        s.handle_key_event(key(KeyCode::Right)).unwrap();
        assert_eq!(s.controller.query().filter("filter_by"), Some("yesterday"));
        s.handle_key_event(key(KeyCode::Left)).unwrap();
        s.handle_key_event(key(KeyCode::Left)).unwrap();
        assert_eq!(s.controller.query().filter("filter_by"), None);

        s.handle_key_event(key(KeyCode::Left)).unwrap();
        assert_eq!(s.controller.query().filter("filter_by"), Some("this_month"));
        s.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert_eq!(s.controller.query().filter("filter_by"), None);

        s.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(!s.captures_input());
    }

    #[test]
    fn fetch_errors_are_reported_once() {
        let mut s = screen(ScreenId::Vendors);
        let failed = ResultState {
            error: Some("Server Error".into()),
            ..ResultState::default()
        };
        let first = s
            .update(&Action::ResultsUpdated(ScreenId::Vendors, failed.clone()))
            .unwrap();
        assert!(matches!(first, Some(Action::ReportErrors(ref m)) if m.first().map(String::as_str) == Some("Server Error")));
        let again = s
            .update(&Action::ResultsUpdated(ScreenId::Vendors, failed))
            .unwrap();
        assert!(again.is_none());
        assert_eq!(s.results.view(), ViewState::Failed);

        // Another screen's results are not ours.
        let other = s
            .update(&Action::ResultsUpdated(
                ScreenId::Colours,
                ResultState {
                    error: Some("x".into()),
                    ..ResultState::default()
                },
            ))
            .unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn create_opens_the_form_and_escape_closes_it() {
        let mut s = screen(ScreenId::Vendors);
        assert!(s.handle_key_event(key(KeyCode::Char('c'))).unwrap().is_none());
        assert!(s.captures_input());
        s.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(!s.captures_input());
    }

    #[test]
    fn read_only_lists_refuse_create() {
        let mut s = screen(ScreenId::MrfProducts);
        let action = s.handle_key_event(key(KeyCode::Char('c'))).unwrap();
        assert!(matches!(action, Some(Action::Notify(ref n)) if n.message == "MRF Products is read-only"));
        assert!(!s.captures_input());
    }

    #[test]
    fn failed_save_puts_the_draft_back() {
        let mut s = screen(ScreenId::Vendors);
        s.handle_key_event(key(KeyCode::Char('c'))).unwrap();
        let Some(Overlay::Form(editor)) = &mut s.overlay else {
            panic!("form should be open");
        };
        editor.set_saving(true);
        let session = editor.session().clone();

        let report = SaveReport {
            session: Box::new(session),
            outcome: Err(vec!["name: required".into()]),
        };
        let action = s.update(&Action::EditSaved(ScreenId::Vendors, report)).unwrap();
        assert!(matches!(action, Some(Action::ReportErrors(_))));
        let Some(Overlay::Form(editor)) = &s.overlay else {
            panic!("form should stay open");
        };
        assert!(!editor.is_saving());
    }
}
