//! List-filter-paginate-edit engine between `erpdesk-api` and the
//! front ends (CLI / TUI).
//!
//! Every list page of the ERP desk works the same way: a query (search,
//! filters, page) drives a fetch, the fetch produces a result set, and
//! a record from that set can be opened, edited and saved back.
//!
//! - **[`ListController`]**: Per-resource facade. Owns the query state,
//!   the sequence-guarded [`FetchCoordinator`] and the busy flag, spawns
//!   option-list fetches, and routes saves and exports.
//!
//! - **[`QueryController`]**: Search, filters and page on a `watch`
//!   channel. Search and filter changes always return to page 1.
//!
//! - **[`EditSession`]** / **[`TabbedSession`]**: Draft editors with
//!   local validation and derived-field rules, declared per form in the
//!   [`catalog`].
//!
//! - **[`ExportJob`]**: Unpaginated fetch written atomically as CSV.
//!
//! - **[`CoreError`]** / **[`ErrorQueue`]**: One user-facing message per
//!   failure, queued and shown one at a time.
#![recursion_limit = "256"]

pub mod autofill;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod debounce;
pub mod edit;
pub mod error;
pub mod export;
pub mod fetch;
pub mod form;
pub mod invoice;
pub mod model;
pub mod notify;
pub mod options;
pub mod pagination;
pub mod query;
pub mod resource;
pub mod session;
pub mod tabs;

// ── Primary re-exports ──────────────────────────────────────────────
pub use autofill::{PostalAutofill, PostalFill, apply_fill, fill_session, is_valid_pincode};
pub use backend::{Backend, PostalLookup};
pub use config::BackendConfig;
pub use controller::ListController;
pub use dashboard::Dashboard;
pub use debounce::Debouncer;
pub use edit::{EditMode, EditSession, SaveTarget, Saved};
pub use erpdesk_api::{
    DEFAULT_POSTAL_URL, ErpClient, FieldErrors, PostalClient, PostalPlace, TransportConfig,
};
pub use error::{CoreError, NO_RESPONSE_MESSAGE, SERVER_ERROR_MESSAGE};
pub use export::{ExportJob, ExportSummary};
pub use fetch::{BusyFlag, FetchCoordinator, FetchOutcome, ResultState};
pub use form::{FieldKind, FieldSpec, FormSpec};
pub use invoice::{LeadCompleteness, ProformaDraft, ProformaForm, ProductLine};
pub use model::{Record, RecordId};
pub use notify::ErrorQueue;
pub use options::{OptionItem, OptionsCache};
pub use pagination::{PAGE_SIZE, ResultSet, ViewState};
pub use query::{QueryController, QueryState};
pub use resource::{OptionSource, Resource, SearchMode};
pub use session::{Session, UserProfile};
pub use tabs::{CompanyTab, TabbedSession};
