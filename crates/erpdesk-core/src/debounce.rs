// ── Cancellable timer ──

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delay before a postal lookup fires after the last keystroke.
pub const POSTAL_DEBOUNCE: Duration = Duration::from_millis(500);

/// Delay used to coalesce bursts of query changes into one fetch.
pub const FETCH_COALESCE: Duration = Duration::from_millis(16);

/// Runs a deferred action after a quiet period.
///
/// Holds at most one pending timer. Scheduling again aborts the pending
/// one, so only the last input of a burst ever runs. Dropping the
/// debouncer cancels whatever is pending.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
