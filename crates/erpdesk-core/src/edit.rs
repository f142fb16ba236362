// ── Edit sessions ──
//
// A session is closed, or open on a draft for either a new record or
// an existing one. Nothing reaches the backend until `save`, and a
// failed save leaves the session open with the draft untouched.

use std::sync::Arc;

use erpdesk_api::FieldErrors;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::CoreError;
use crate::form::{FormSpec, Submit};
use crate::model::{Record, RecordId};

/// Whether an open session creates or updates.
#[derive(Debug, Clone, PartialEq)]
pub enum EditMode {
    Create,
    /// Snapshot of the record as it was when the session opened.
    Update(Arc<Record>),
}

#[derive(Debug, Clone)]
enum State {
    Closed,
    Open {
        mode: EditMode,
        draft: Map<String, Value>,
        /// Draft as first opened, for dirty tracking.
        baseline: Map<String, Value>,
        field_errors: FieldErrors,
    },
}

/// Request a save turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    Post(String),
    Patch(String),
}

impl SaveTarget {
    pub fn path(&self) -> &str {
        match self {
            Self::Post(p) | Self::Patch(p) => p,
        }
    }
}

/// A save the backend accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub created: bool,
    /// Backend response body.
    pub response: Value,
}

/// Draft editor for one form.
#[derive(Debug, Clone)]
pub struct EditSession {
    form: &'static FormSpec,
    state: State,
}

impl EditSession {
    pub fn new(form: &'static FormSpec) -> Self {
        Self {
            form,
            state: State::Closed,
        }
    }

    pub fn form(&self) -> &'static FormSpec {
        self.form
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    pub fn mode(&self) -> Option<&EditMode> {
        match &self.state {
            State::Open { mode, .. } => Some(mode),
            State::Closed => None,
        }
    }

    /// Open on a blank draft. Replaces any draft already open.
    pub fn open_create(&mut self) {
        let draft = self.form.blank();
        debug!(form = self.form.title, "edit session opened for create");
        self.open(EditMode::Create, draft);
    }

    /// Open on a copy of `record`. The snapshot itself is never modified.
    pub fn open_update(&mut self, record: Arc<Record>) {
        let draft = self.form.draft_from(record.fields());
        debug!(form = self.form.title, id = ?record.id(), "edit session opened for update");
        self.open(EditMode::Update(record), draft);
    }

    fn open(&mut self, mode: EditMode, draft: Map<String, Value>) {
        self.state = State::Open {
            mode,
            baseline: draft.clone(),
            draft,
            field_errors: FieldErrors::default(),
        };
    }

    pub fn draft(&self) -> Option<&Map<String, Value>> {
        match &self.state {
            State::Open { draft, .. } => Some(draft),
            State::Closed => None,
        }
    }

    /// Field errors from the last failed save.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match &self.state {
            State::Open { field_errors, .. } => Some(field_errors),
            State::Closed => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        match &self.state {
            State::Open { draft, baseline, .. } => draft != baseline,
            State::Closed => false,
        }
    }

    /// Set one field and re-run the form's derived rules.
    pub fn set_field(&mut self, key: &str, value: impl Into<Value>) -> Result<(), CoreError> {
        let State::Open { draft, .. } = &mut self.state else {
            return Err(CoreError::SessionClosed);
        };
        draft.insert(key.to_owned(), value.into());
        self.form.apply_derived(draft, Some(key));
        Ok(())
    }

    /// Discard the draft. No backend call.
    pub fn cancel(&mut self) {
        if self.is_open() {
            debug!(form = self.form.title, "edit session cancelled");
        }
        self.state = State::Closed;
    }

    /// The request `save` would issue for the current mode.
    pub fn default_target(&self) -> Result<SaveTarget, CoreError> {
        let State::Open { mode, .. } = &self.state else {
            return Err(CoreError::SessionClosed);
        };
        match (self.form.submit, mode) {
            (Submit::Action(path), _) | (Submit::Collection(path), EditMode::Create) => {
                Ok(SaveTarget::Post(path.to_owned()))
            }
            (Submit::Collection(endpoint), EditMode::Update(record)) => {
                let id = record_id(record)?;
                Ok(SaveTarget::Patch(format!("{endpoint}{}/", id.path_segment())))
            }
        }
    }

    /// Validate locally, then submit to the form's default target.
    pub async fn save<B: Backend>(&mut self, backend: &B) -> Result<Saved, CoreError> {
        let target = self.default_target()?;
        self.save_to(backend, target).await
    }

    /// Validate locally, then submit to `target`.
    ///
    /// Local failures never reach the backend. On any failure the
    /// session stays open with its draft and records the field errors.
    pub async fn save_to<B: Backend>(
        &mut self,
        backend: &B,
        target: SaveTarget,
    ) -> Result<Saved, CoreError> {
        let State::Open {
            mode,
            draft,
            field_errors,
            ..
        } = &mut self.state
        else {
            return Err(CoreError::SessionClosed);
        };

        if let Err(errors) = self.form.validate(draft) {
            debug!(form = self.form.title, %errors, "draft rejected locally");
            *field_errors = errors.clone();
            return Err(CoreError::Invalid { errors });
        }

        let body = self.form.payload(draft);
        let created = matches!(mode, EditMode::Create);
        let result = match &target {
            SaveTarget::Post(path) => backend.post(path, &body).await,
            SaveTarget::Patch(path) => backend.patch(path, &body).await,
        };

        match result {
            Ok(response) => {
                info!(form = self.form.title, path = target.path(), created, "saved");
                self.state = State::Closed;
                Ok(Saved { created, response })
            }
            Err(e) => {
                warn!(form = self.form.title, path = target.path(), error = %e, "save failed");
                *field_errors = e.field_errors().cloned().unwrap_or_default();
                Err(e)
            }
        }
    }
}

fn record_id(record: &Record) -> Result<RecordId, CoreError> {
    record
        .id()
        .ok_or_else(|| CoreError::Internal("record has no id".into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use erpdesk_api::{ListQuery, Page};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::catalog::{BULK_ASSIGN_FORM, VENDOR_FORM};

    /// Records every write; answers with a canned result.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String, Value)>>,
        reject: Option<FieldErrors>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<(String, String, Value)> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, verb: &str, path: &str, body: &Value) -> Result<Value, CoreError> {
            self.calls
                .lock()
                .unwrap()
                .push((verb.to_owned(), path.to_owned(), body.clone()));
            match &self.reject {
                Some(errors) => Err(CoreError::Rejected {
                    errors: errors.clone(),
                }),
                None => Ok(json!({"id": 99})),
            }
        }
    }

    impl Backend for Recorder {
        async fn list_page(&self, _: &str, _: &ListQuery) -> Result<Page<Record>, CoreError> {
            unreachable!()
        }

        async fn list_all(&self, _: &str, _: &ListQuery) -> Result<Vec<Record>, CoreError> {
            unreachable!()
        }

        async fn get(&self, _: &str, _: &[(String, String)]) -> Result<Value, CoreError> {
            unreachable!()
        }

        async fn post(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
            self.answer("POST", path, body)
        }

        async fn patch(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
            self.answer("PATCH", path, body)
        }
    }

    fn vendor(id: u64) -> Arc<Record> {
        Arc::new(
            Record::try_from(json!({
                "id": id,
                "type": "Domestic",
                "name": "Acme",
                "pan_number": "ABCDE1234F",
                "country": "India",
                "created_at": "2024-01-01",
            }))
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn update_patches_record_path_and_closes() {
        let backend = Recorder::default();
        let mut s = EditSession::new(&VENDOR_FORM);
        s.open_update(vendor(7));
        s.set_field("name", "Acme Tapes").unwrap();

        let saved = s.save(&backend).await.unwrap();
        assert!(!saved.created);
        assert!(!s.is_open());

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "PATCH");
        assert_eq!(calls[0].1, "api/inventory/vendor/7/");
        assert_eq!(calls[0].2["name"], json!("Acme Tapes"));
        assert!(calls[0].2.get("created_at").is_none());
    }

    #[tokio::test]
    async fn backend_rejection_keeps_session_and_draft() {
        let backend = Recorder {
            reject: Some(FieldErrors::single("pan_number", "required")),
            ..Recorder::default()
        };
        let mut s = EditSession::new(&VENDOR_FORM);
        s.open_create();
        s.set_field("name", "New Vendor").unwrap();
        s.set_field("pan_number", "X").unwrap();

        let err = s.save(&backend).await.unwrap_err();
        assert_eq!(err.user_message(), "pan_number: required");
        assert!(s.is_open());
        assert_eq!(s.draft().unwrap()["name"], json!("New Vendor"));
        assert_eq!(s.field_errors().unwrap().first("pan_number"), Some("required"));
        assert_eq!(backend.calls()[0].0, "POST");
    }

    #[tokio::test]
    async fn local_validation_never_calls_backend() {
        let backend = Recorder::default();
        let mut s = EditSession::new(&BULK_ASSIGN_FORM);
        s.open_create();
        s.set_field("assign_from", "a@x.in").unwrap();
        s.set_field("assign_to", "a@x.in").unwrap();

        let err = s.save(&backend).await.unwrap_err();
        assert!(err.is_local());
        assert_eq!(err.user_message(), "assign_from: Assign From will not same as Assign To");
        assert!(backend.calls().is_empty());
        assert!(s.is_open());
    }

    #[tokio::test]
    async fn action_forms_always_post() {
        let backend = Recorder::default();
        let mut s = EditSession::new(&BULK_ASSIGN_FORM);
        s.open_create();
        s.set_field("assign_from", "a@x.in").unwrap();
        s.set_field("assign_to", "b@x.in").unwrap();
        s.save(&backend).await.unwrap();
        assert_eq!(backend.calls()[0].1, "api/customer/bulk-assign/");
    }

    #[test]
    fn cancel_discards_draft_and_leaves_snapshot() {
        let record = vendor(7);
        let mut s = EditSession::new(&VENDOR_FORM);
        s.open_update(Arc::clone(&record));
        s.set_field("name", "Changed").unwrap();
        assert!(s.is_dirty());

        s.cancel();
        assert!(!s.is_open());
        assert_eq!(record.text("name"), "Acme");
        assert!(matches!(s.set_field("name", "x"), Err(CoreError::SessionClosed)));
    }

    #[tokio::test]
    async fn saving_a_closed_session_fails() {
        let backend = Recorder::default();
        let mut s = EditSession::new(&VENDOR_FORM);
        assert!(matches!(s.save(&backend).await, Err(CoreError::SessionClosed)));
    }
}
