// ── List controller ──
//
// Ties one resource's query state to its result state. A background
// driver watches the query, coalesces bursts of changes, derives the
// backend request and issues a sequence-guarded fetch whenever the
// request actually changed.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use erpdesk_api::{FieldErrors, ListQuery};
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::debounce::FETCH_COALESCE;
use crate::edit::{EditSession, Saved};
use crate::error::CoreError;
use crate::export::{ExportJob, ExportSummary};
use crate::form::FieldKind;
use crate::fetch::{BusyFlag, FetchCoordinator, FetchOutcome, ResultState, Ticket};
use crate::model::Record;
use crate::options::OptionsCache;
use crate::pagination::{ResultSet, local_filter};
use crate::query::{QueryController, QueryState};
use crate::resource::{Resource, SearchMode};
use crate::session::Session;

/// Field naming the user a record belongs to.
const OWNER_FIELD: &str = "assigned_to";

/// List-filter-paginate-edit controller for one resource.
///
/// Cheaply cloneable; clones share all state.
pub struct ListController<B: Backend> {
    inner: Arc<Inner<B>>,
}

impl<B: Backend> Clone for ListController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B> {
    resource: &'static Resource,
    backend: Arc<B>,
    session: Arc<Session>,
    query: QueryController,
    fetch: FetchCoordinator,
    busy: BusyFlag,
    options: Arc<OptionsCache>,
    /// Request behind the newest issued fetch.
    last_request: Mutex<Option<ListQuery>>,
    cancel: CancellationToken,
    task_handles: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl<B: Backend> ListController<B> {
    /// Create a controller. Nothing is fetched until [`start`](Self::start)
    /// or [`load`](Self::load).
    pub fn new(resource: &'static Resource, backend: Arc<B>, session: Arc<Session>) -> Self {
        Self::with_query(resource, backend, session, resource.initial_query())
    }

    /// Create a controller starting from `query` instead of the defaults.
    /// The page is taken as given, without clamping.
    pub fn with_query(
        resource: &'static Resource,
        backend: Arc<B>,
        session: Arc<Session>,
        query: QueryState,
    ) -> Self {
        let busy = BusyFlag::new();
        Self {
            inner: Arc::new(Inner {
                resource,
                backend,
                session,
                query: QueryController::new(query),
                fetch: FetchCoordinator::new(busy.clone()),
                busy,
                options: Arc::new(OptionsCache::new()),
                last_request: Mutex::new(None),
                cancel: CancellationToken::new(),
                task_handles: AsyncMutex::new(Vec::new()),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn resource(&self) -> &'static Resource {
        self.inner.resource
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.inner.backend
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.inner.busy
    }

    pub fn options(&self) -> &Arc<OptionsCache> {
        &self.inner.options
    }

    pub fn query(&self) -> QueryState {
        self.inner.query.current()
    }

    pub fn subscribe_query(&self) -> watch::Receiver<QueryState> {
        self.inner.query.subscribe()
    }

    pub fn results(&self) -> ResultState {
        self.inner.fetch.snapshot()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<ResultState> {
        self.inner.fetch.subscribe()
    }

    /// Records to display: the loaded page, narrowed by the local
    /// search when the resource searches client-side.
    pub fn visible_items(&self) -> Vec<Record> {
        let state = self.inner.fetch.snapshot();
        let Some(result) = state.result else {
            return Vec::new();
        };
        match self.inner.resource.search {
            SearchMode::LocalPage { fields } => {
                let search = self.inner.query.current().search;
                local_filter(&result.items, &search, fields)
                    .into_iter()
                    .cloned()
                    .collect()
            }
            SearchMode::Server | SearchMode::Disabled => result.items,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the query driver and the option list fetches, and issue
    /// the first list fetch.
    pub async fn start(&self) {
        let inner = &self.inner;
        let sources = inner
            .resource
            .filters
            .iter()
            .map(|f| f.source)
            .chain(inner.resource.side_lists.iter().map(|(_, s)| *s))
            .chain(
                inner
                    .resource
                    .form
                    .into_iter()
                    .flat_map(|f| f.fields.iter())
                    .filter_map(|f| match f.kind {
                        FieldKind::Choice(source) => Some(source),
                        _ => None,
                    }),
            );

        let mut handles = inner.task_handles.lock().await;
        handles.extend(inner.options.spawn_all(&inner.backend, sources));

        let rx = inner.query.subscribe();
        let initial = rx.borrow().clone();
        self.dispatch(&initial, false);

        let ctrl = self.clone();
        let cancel = inner.cancel.child_token();
        handles.push(tokio::spawn(query_driver_task(ctrl, rx, cancel)));
        info!(resource = inner.resource.key, "list controller started");
    }

    /// Stop the driver and wait for background tasks to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!(resource = self.inner.resource.key, "list controller stopped");
    }

    // ── Query operations ─────────────────────────────────────────────

    pub fn set_search(&self, text: impl Into<String>) -> Result<(), CoreError> {
        if self.inner.resource.search == SearchMode::Disabled {
            return Err(CoreError::Invalid {
                errors: FieldErrors::single("search", "this list has no search"),
            });
        }
        self.inner.query.set_search(text);
        Ok(())
    }

    pub fn set_filter(&self, name: &str, value: Option<String>) -> Result<(), CoreError> {
        if self.inner.resource.filter(name).is_none() {
            return Err(CoreError::Invalid {
                errors: FieldErrors::single(name, "unknown filter"),
            });
        }
        self.inner.query.set_filter(name, value);
        Ok(())
    }

    /// Move to page `n`, clamped to the pages the last result for the
    /// current search and filters reported.
    pub fn set_page(&self, n: u32) -> u32 {
        self.inner.query.set_page(n, self.page_bound())
    }

    pub fn next_page(&self) -> u32 {
        self.inner.query.next_page(self.page_bound())
    }

    pub fn prev_page(&self) -> u32 {
        self.inner.query.prev_page(self.page_bound())
    }

    pub fn reset(&self) {
        self.inner.query.reset();
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.fetch.snapshot().total_pages()
    }

    fn page_bound(&self) -> u32 {
        let current = self.inner.resource.request(&self.inner.query.current());
        self.inner.fetch.snapshot().page_bound(&current)
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Re-fetch the current query even if it has not changed.
    pub fn refresh(&self) {
        let state = self.inner.query.current();
        self.dispatch(&state, true);
    }

    /// Fetch the current query and wait for it. For one-shot callers
    /// that never start the driver.
    pub async fn load(&self) -> FetchOutcome {
        let state = self.inner.query.current();
        let request = self.inner.resource.request(&state);
        self.remember(&request);
        let ticket = self.inner.fetch.begin_for(request.clone());
        run_fetch(&self.inner, ticket, request).await
    }

    /// Spawn a fetch for `state` unless its request matches the newest one.
    fn dispatch(&self, state: &QueryState, force: bool) {
        let request = self.inner.resource.request(state);
        let fresh = self.remember(&request);
        if !fresh && !force {
            debug!(resource = self.inner.resource.key, "request unchanged, fetch skipped");
            return;
        }
        // Issued before spawning so the sequence and busy flag reflect
        // the fetch as soon as this returns.
        let ticket = self.inner.fetch.begin_for(request.clone());
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            run_fetch(&inner, ticket, request).await;
        });
    }

    /// Record `request` as the newest. Returns false if it was already.
    fn remember(&self, request: &ListQuery) -> bool {
        let mut last = self
            .inner
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(request) {
            return false;
        }
        *last = Some(request.clone());
        true
    }

    // ── Editing ──────────────────────────────────────────────────────

    /// A closed session on this resource's form.
    pub fn editor(&self) -> Result<EditSession, CoreError> {
        self.inner
            .resource
            .form
            .map(EditSession::new)
            .ok_or_else(|| CoreError::Internal(format!("{} has no edit form", self.inner.resource.key)))
    }

    /// A session open for a new record. Forms that track an owner start
    /// out assigned to the signed-in user.
    pub fn new_record(&self) -> Result<EditSession, CoreError> {
        let mut session = self.editor()?;
        session.open_create();
        let email = &self.inner.session.user().email;
        if !email.is_empty() && session.form().field(OWNER_FIELD).is_some() {
            session.set_field(OWNER_FIELD, email.clone())?;
        }
        Ok(session)
    }

    /// Save `session`; on success the list is re-fetched.
    pub async fn save(&self, session: &mut EditSession) -> Result<Saved, CoreError> {
        let _busy = self.inner.busy.acquire();
        let saved = session.save(self.inner.backend.as_ref()).await?;
        self.refresh();
        Ok(saved)
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Export every record matching the current search and filters.
    pub async fn export(&self, dest: &Path) -> Result<ExportSummary, CoreError> {
        let _busy = self.inner.busy.acquire();
        let job = ExportJob::new(self.inner.resource, &self.inner.query.current());
        job.run(self.inner.backend.as_ref(), dest).await
    }
}

async fn run_fetch<B: Backend>(inner: &Inner<B>, ticket: Ticket, request: ListQuery) -> FetchOutcome {
    let resource = inner.resource;
    let result = match resource.page_size {
        Some(size) => inner
            .backend
            .list_page(resource.endpoint, &request)
            .await
            .map(|page| ResultSet::from_page(page, request.page.unwrap_or(1), size)),
        None => inner
            .backend
            .list_all(resource.endpoint, &request)
            .await
            .map(ResultSet::single),
    };
    inner.fetch.complete(ticket, result)
}

/// Watch the query and fetch after each quiet period.
async fn query_driver_task<B: Backend>(
    ctrl: ListController<B>,
    mut rx: watch::Receiver<QueryState>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(FETCH_COALESCE) => {}
                }
                let state = rx.borrow_and_update().clone();
                ctrl.dispatch(&state, false);
            }
        }
    }
}
