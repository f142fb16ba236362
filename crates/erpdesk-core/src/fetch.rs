// ── Fetch coordination ──
//
// Every outgoing list fetch takes a ticket carrying a monotonically
// increasing sequence number. Only the ticket matching the newest
// issued sequence may write to the result state; anything older that
// resolves late is dropped on the floor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use erpdesk_api::ListQuery;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::pagination::{ResultSet, ViewState};

// ── Busy flag ───────────────────────────────────────────────────────

/// Counts outstanding requests owned by one controller.
///
/// Busy while the count is non-zero. Each controller has its own flag.
#[derive(Debug, Clone)]
pub struct BusyFlag {
    outstanding: Arc<AtomicUsize>,
    tx: Arc<watch::Sender<bool>>,
}

impl BusyFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            outstanding: Arc::new(AtomicUsize::new(0)),
            tx: Arc::new(tx),
        }
    }

    /// Mark one request outstanding until the guard drops.
    pub fn acquire(&self) -> BusyGuard {
        if self.outstanding.fetch_add(1, Ordering::SeqCst) == 0 {
            self.tx.send_replace(true);
        }
        BusyGuard { flag: self.clone() }
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases one outstanding request on drop.
#[derive(Debug)]
pub struct BusyGuard {
    flag: BusyFlag,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.flag.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.flag.tx.send_replace(false);
        }
    }
}

// ── Result state ────────────────────────────────────────────────────

/// What the list view renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultState {
    pub result: Option<ResultSet>,
    /// Request `result` was fetched for, when the fetch named one.
    pub request: Option<ListQuery>,
    /// User-facing message of the last failed fetch, cleared on success.
    pub error: Option<String>,
    pub loading: bool,
}

impl ResultState {
    pub fn view(&self) -> ViewState {
        match (&self.result, self.loading, &self.error) {
            (Some(rs), _, _) if rs.is_empty() => ViewState::Empty,
            (Some(_), _, _) => ViewState::Ready,
            (None, false, Some(_)) => ViewState::Failed,
            (None, _, _) => ViewState::Loading,
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.result.as_ref().map_or(0, ResultSet::total_pages)
    }

    /// Pages a move may land on while `current` is the query in force.
    ///
    /// The reported total only counts when the result answers the same
    /// search and filters. A result for an older query says nothing
    /// about the new one, so only page 1 is safe until it arrives.
    pub fn page_bound(&self, current: &ListQuery) -> u32 {
        match self.request {
            Some(ref applied) if applied.same_query(current) => self.total_pages().max(1),
            _ => 1,
        }
    }
}

// ── Tickets ─────────────────────────────────────────────────────────

/// Proof that a fetch was issued. Holding it keeps the controller busy.
#[derive(Debug)]
pub struct Ticket {
    seq: u64,
    request: Option<ListQuery>,
    _busy: BusyGuard,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Newest fetch succeeded; the result set was replaced.
    Applied,
    /// A newer fetch was issued meanwhile; this response was dropped.
    Discarded,
    /// Newest fetch failed; the previous result set was kept.
    Failed(String),
}

// ── Coordinator ─────────────────────────────────────────────────────

/// Sequence-guarded owner of one list's [`ResultState`].
#[derive(Debug)]
pub struct FetchCoordinator {
    latest: AtomicU64,
    state: watch::Sender<ResultState>,
    busy: BusyFlag,
}

impl FetchCoordinator {
    pub fn new(busy: BusyFlag) -> Self {
        let (state, _rx) = watch::channel(ResultState::default());
        Self {
            latest: AtomicU64::new(0),
            state,
            busy,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResultState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ResultState {
        self.state.borrow().clone()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn begin(&self) -> Ticket {
        self.issue(None)
    }

    /// Like [`begin`](Self::begin), remembering which request the
    /// ticket's result will answer.
    pub fn begin_for(&self, request: ListQuery) -> Ticket {
        self.issue(Some(request))
    }

    fn issue(&self, request: Option<ListQuery>) -> Ticket {
        let busy = self.busy.acquire();
        let mut seq = 0;
        // Sequence bumps happen under the state lock so `complete` sees
        // either the old or the new sequence, never a half-applied pair.
        self.state.send_if_modified(|s| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            let was = s.loading;
            s.loading = true;
            !was
        });
        debug!(seq, "fetch issued");
        Ticket {
            seq,
            request,
            _busy: busy,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.seq == self.latest.load(Ordering::SeqCst)
    }

    /// Reconcile a finished fetch against the newest issued ticket.
    pub fn complete(&self, ticket: Ticket, result: Result<ResultSet, CoreError>) -> FetchOutcome {
        let mut outcome = FetchOutcome::Discarded;
        self.state.send_if_modified(|s| {
            if !self.is_current(&ticket) {
                return false;
            }
            match result {
                Ok(rs) => {
                    debug!(seq = ticket.seq, items = rs.items.len(), total = rs.total_count, "fetch applied");
                    s.result = Some(rs);
                    s.request = ticket.request.clone();
                    s.error = None;
                    outcome = FetchOutcome::Applied;
                }
                Err(e) => {
                    let message = e.user_message();
                    warn!(seq = ticket.seq, error = %e, "fetch failed");
                    s.error = Some(message.clone());
                    outcome = FetchOutcome::Failed(message);
                }
            }
            s.loading = false;
            true
        });

        if outcome == FetchOutcome::Discarded {
            debug!(
                seq = ticket.seq,
                latest = self.latest.load(Ordering::SeqCst),
                "fetch discarded as stale"
            );
        }
        outcome
    }

    /// Drop the current error without touching the result set.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }
}
