//! Application core: event loop, screen management, action dispatch.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Tabs, Wrap},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tracing::{debug, info};

use erpdesk_core::ErrorQueue;

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::popup;

/// Toasts disappear after this long.
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    /// Signed-in user and backend host, for the status bar.
    identity: String,
    help_visible: bool,
    search_active: bool,
    search_query: String,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Failures waiting to be shown, one at a time.
    errors: ErrorQueue,
    notification: Option<(Notification, Instant)>,
    /// Screens with a fetch, save or export in flight.
    busy: HashSet<ScreenId>,
    throbber: ThrobberState,
}

impl App {
    pub fn new(
        screens: Vec<(ScreenId, Box<dyn Component>)>,
        initial: ScreenId,
        identity: String,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            active_screen: initial,
            previous_screen: None,
            screens: screens.into_iter().collect(),
            running: true,
            identity,
            help_visible: false,
            search_active: false,
            search_query: String::new(),
            action_tx,
            action_rx,
            errors: ErrorQueue::new(),
            notification: None,
            busy: HashSet::new(),
            throbber: ThrobberState::default(),
        }
    }

    /// Hand every screen the action sender, then focus the initial one
    /// (which starts its data bridge).
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize => self.action_tx.send(Action::Resize)?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        for screen in self.screens.values_mut() {
            screen.shutdown();
        }
        events.stop();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Input ────────────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl_c = key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c');
        if ctrl_c {
            return Ok(Some(Action::Quit));
        }

        // The error toast is modal until dismissed.
        if self.errors.current().is_some() {
            return Ok(match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(Action::DismissError),
                _ => None,
            });
        }

        if self.search_active {
            return Ok(match key.code {
                KeyCode::Esc => Some(Action::CloseSearch),
                KeyCode::Enter => Some(Action::SearchSubmit(self.search_query.clone())),
                KeyCode::Backspace => {
                    self.search_query.pop();
                    Some(Action::SearchInput(self.search_query.clone()))
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    Some(Action::SearchInput(self.search_query.clone()))
                }
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        // Open forms and the filter bar take every key.
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            if screen.captures_input() {
                return screen.handle_key_event(key);
            }
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char('/')) => return Ok(Some(Action::OpenSearch)),
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='8')) => {
                let n = c.to_digit(10).and_then(|d| usize::try_from(d).ok());
                if let Some(screen) = n.and_then(ScreenId::from_number) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Deliver `action` to one screen and queue its follow-up.
    fn route(&mut self, id: ScreenId, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&id) {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.previous_screen = Some(self.active_screen);
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::OpenSearch => {
                self.search_active = true;
                self.search_query.clear();
            }

            Action::CloseSearch => {
                self.search_active = false;
                self.search_query.clear();
            }

            Action::Render | Action::Resize => {}

            Action::SearchInput(_) => self.route(self.active_screen, action)?,

            Action::SearchSubmit(_) => {
                self.search_active = false;
                self.route(self.active_screen, action)?;
                self.search_query.clear();
            }

            Action::Tick => {
                if let Some((_, shown)) = &self.notification {
                    if shown.elapsed() > NOTIFICATION_TTL {
                        self.notification = None;
                    }
                }
                if !self.busy.is_empty() {
                    self.throbber.calc_next();
                }
                self.route(self.active_screen, action)?;
            }

            Action::BusyChanged(id, busy) => {
                if *busy {
                    self.busy.insert(*id);
                } else {
                    self.busy.remove(id);
                }
                self.route(*id, action)?;
            }

            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), Instant::now()));
            }

            Action::ReportErrors(messages) => self.errors.push_all(messages.iter().cloned()),

            Action::DismissError => {
                self.errors.dismiss();
            }

            other => {
                if let Some(id) = other.screen() {
                    self.route(id, other)?;
                }
            }
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [content_area, tab_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content_area);
        }
        self.render_tab_bar(frame, tab_area);
        self.render_status_bar(frame, status_area);

        // Overlays, last is topmost.
        if let Some((ref notification, _)) = self.notification {
            render_notification(frame, area, notification);
        }
        if let Some(message) = self.errors.current() {
            self.render_error(frame, area, message);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                let marker = if self.busy.contains(&id) { "◌" } else { "" };
                Line::from(Span::styled(
                    format!(" {} {}{marker} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(self.active_screen.number() - 1);
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if self.search_active {
            let line = Line::from(vec![
                Span::styled(" / ", Style::default().fg(theme::ELECTRIC_PURPLE)),
                Span::styled(self.search_query.as_str(), Style::default().fg(theme::NEON_CYAN)),
                Span::styled("█", Style::default().fg(theme::NEON_CYAN)),
                Span::styled("  Esc cancel  Enter search", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let [spinner_area, line_area] = if self.busy.is_empty() {
            [Rect::default(), area]
        } else {
            Layout::horizontal([Constraint::Length(12), Constraint::Min(1)]).areas(area)
        };
        if !self.busy.is_empty() {
            let spinner = Throbber::default()
                .label(" working")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(spinner, spinner_area, &mut self.throbber.clone());
        }

        let hints = self
            .screens
            .get(&self.active_screen)
            .map_or("", |s| s.key_hints());
        let line = Line::from(vec![
            Span::styled(" ● ", Style::default().fg(theme::SUCCESS_GREEN)),
            Span::styled(self.identity.as_str(), Style::default().fg(theme::DIM_WHITE)),
            Span::styled(format!(" │ {hints}"), theme::key_hint()),
            Span::styled("  / search  ? help  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), line_area);
    }

    fn render_error(&self, frame: &mut Frame, area: Rect, message: &str) {
        let title = match self.errors.len() {
            0 | 1 => "Error".to_owned(),
            n => format!("Error · {} more", n - 1),
        };
        let width = 60u16.min(area.width.saturating_sub(4));
        let dialog = popup::centered(area, width, 7);
        let inner = popup::frame(frame, dialog, &title, Style::default().fg(theme::ERROR_RED));

        let [text, hint] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(theme::DIM_WHITE)))
                .wrap(Wrap { trim: true }),
            text,
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("dismiss", theme::key_hint()),
            ])),
            hint,
        );
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let dialog = popup::centered(area, 60, 24);
    let inner = popup::frame(frame, dialog, "Keyboard Shortcuts", theme::border_focused());

    let section = |name: &'static str| {
        Line::from(Span::styled(format!("  {name}"), Style::default().fg(theme::NEON_CYAN)))
    };
    let row = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<12}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let help_text = vec![
        section("Lists"),
        row("1-8 Tab", "Switch list"),
        row("j/k ↑/↓", "Move up/down"),
        row("g/G", "Top / bottom"),
        row("n/p →/←", "Next / previous page"),
        row("/", "Search"),
        row("f", "Filters (←/→ value, Bksp clear)"),
        row("r", "Refresh"),
        row("x", "Export CSV"),
        Line::from(""),
        section("Records"),
        row("c", "New record"),
        row("e Enter", "Edit selected"),
        row("Tab ↑/↓", "Next / previous field"),
        row("←/→", "Cycle a choice"),
        row("Enter ^S", "Save"),
        row("PgUp/PgDn", "Company tabs"),
        row("Esc", "Cancel / close"),
        Line::from(""),
        section("Global"),
        row("?", "This help"),
        row("q ^C", "Quit"),
    ];
    frame.render_widget(Paragraph::new(help_text), inner);
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let chars = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = chars.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16;
    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2);
    let toast = Rect::new(area.x + x, area.y + y, width, height);

    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Info => (theme::NEON_CYAN, "·"),
    };
    let inner = popup::frame(frame, toast, "", Style::default().fg(color));
    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(notification.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(Vec::new(), ScreenId::Vendors, "tester@erp".into())
    }

    #[test]
    fn error_toast_is_modal_and_advances() {
        let mut app = app();
        app.process_action(&Action::ReportErrors(vec!["a".into(), "b".into()]))
            .unwrap();
        assert_eq!(app.errors.current(), Some("a"));

        // Global keys are swallowed while an error is shown.
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());

        let dismiss = app.handle_key_event(key(KeyCode::Enter)).unwrap().unwrap();
        app.process_action(&dismiss).unwrap();
        assert_eq!(app.errors.current(), Some("b"));
        app.process_action(&Action::DismissError).unwrap();
        assert_eq!(app.errors.current(), None);
        assert!(matches!(
            app.handle_key_event(key(KeyCode::Char('q'))).unwrap(),
            Some(Action::Quit)
        ));
    }

    #[test]
    fn search_box_collects_input_until_enter() {
        let mut app = app();
        app.process_action(&Action::OpenSearch).unwrap();
        for c in "acme".chars() {
            app.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_key_event(key(KeyCode::Backspace)).unwrap();
        let submit = app.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(submit, Some(Action::SearchSubmit(ref q)) if q == "acm"));
        app.process_action(&submit.unwrap()).unwrap();
        assert!(!app.search_active);
    }

    #[test]
    fn busy_screens_are_tracked_and_go_back_returns() {
        let mut app = app();
        app.process_action(&Action::BusyChanged(ScreenId::Colours, true)).unwrap();
        assert!(app.busy.contains(&ScreenId::Colours));
        app.process_action(&Action::BusyChanged(ScreenId::Colours, false)).unwrap();
        assert!(app.busy.is_empty());

        app.process_action(&Action::SwitchScreen(ScreenId::Companies)).unwrap();
        assert_eq!(app.active_screen, ScreenId::Companies);
        app.process_action(&Action::GoBack).unwrap();
        let Ok(Action::SwitchScreen(back)) = app.action_rx.try_recv() else {
            panic!("expected a switch back");
        };
        assert_eq!(back, ScreenId::Vendors);
    }
}
