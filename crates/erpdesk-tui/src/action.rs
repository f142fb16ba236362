//! All UI actions. Actions are the sole mechanism for state mutation.

use std::path::PathBuf;

use erpdesk_core::{EditSession, PostalFill, ResultState, TabbedSession};

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
}

/// A short-lived toast. Failures go through the error queue instead.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Outcome of a background save: the session comes back either way,
/// closed on success or still open with its field errors.
#[derive(Debug, Clone)]
pub struct SaveReport<S> {
    pub session: Box<S>,
    pub outcome: Result<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize,

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,

    // ── Search ────────────────────────────────────────────────────
    OpenSearch,
    CloseSearch,
    SearchInput(String),
    SearchSubmit(String),

    // ── Data (from the list bridges) ──────────────────────────────
    ResultsUpdated(ScreenId, ResultState),
    BusyChanged(ScreenId, bool),
    OptionsUpdated(ScreenId),
    PostalResolved(ScreenId, PostalFill),

    // ── Background operations finishing ───────────────────────────
    EditSaved(ScreenId, SaveReport<EditSession>),
    CompanyLoaded(ScreenId, Box<TabbedSession>, Option<Vec<String>>),
    CompanySaved(ScreenId, SaveReport<TabbedSession>),
    ExportFinished(ScreenId, Result<(usize, PathBuf), Vec<String>>),

    // ── Feedback ──────────────────────────────────────────────────
    Notify(Notification),
    /// Replace the error queue with these messages.
    ReportErrors(Vec<String>),
    DismissError,
}

impl Action {
    /// Screen a data or background action belongs to.
    pub fn screen(&self) -> Option<ScreenId> {
        match self {
            Self::ResultsUpdated(id, _)
            | Self::BusyChanged(id, _)
            | Self::OptionsUpdated(id)
            | Self::PostalResolved(id, _)
            | Self::EditSaved(id, _)
            | Self::CompanyLoaded(id, _, _)
            | Self::CompanySaved(id, _)
            | Self::ExportFinished(id, _) => Some(*id),
            _ => None,
        }
    }
}
