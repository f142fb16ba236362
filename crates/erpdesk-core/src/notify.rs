// ── Error queue ──
//
// Validation and request failures are shown one message at a time.
// Dismissing the current message reveals the next; a new failure
// replaces whatever batch is still queued.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::CoreError;

#[derive(Debug, Clone, Default)]
pub struct ErrorQueue {
    pending: VecDeque<String>,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue with `messages`, shown in order.
    pub fn push_all(&mut self, messages: impl IntoIterator<Item = String>) {
        self.pending = messages.into_iter().filter(|m| !m.is_empty()).collect();
        debug!(count = self.pending.len(), "error queue replaced");
    }

    /// Replace the queue with every message carried by `err`.
    pub fn report(&mut self, err: &CoreError) {
        self.push_all(err.field_messages());
    }

    /// Message currently on screen.
    pub fn current(&self) -> Option<&str> {
        self.pending.front().map(String::as_str)
    }

    /// Dismiss the current message; returns the next one, if any.
    pub fn dismiss(&mut self) -> Option<&str> {
        self.pending.pop_front();
        self.current()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
