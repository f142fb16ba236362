#![allow(clippy::unwrap_used)]
// End-to-end list/filter/paginate/edit scenarios against a mock backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use erpdesk_api::{ErpClient, ListQuery, Page};
use erpdesk_core::catalog::{
    APPLICANTS, BULK_ASSIGN_FORM, COMPANIES, FINISHED_GOODS, MRF_PRODUCTS, VENDORS,
};
use erpdesk_core::{
    Backend, CompanyTab, CoreError, EditSession, ErrorQueue, FetchOutcome, ListController,
    NO_RESPONSE_MESSAGE, Record, RecordId, ResultState, SERVER_ERROR_MESSAGE, Session, TabbedSession,
    UserProfile, ViewState,
};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<ErpClient>) {
    let server = MockServer::start().await;
    let client = ErpClient::with_client(&server.uri(), reqwest::Client::new()).unwrap();
    (server, Arc::new(client))
}

fn applicants(range: std::ops::RangeInclusive<u64>) -> Vec<Value> {
    range
        .map(|i| {
            let name = if i == 3 { "Ravi Kumar".to_owned() } else { format!("Candidate {i}") };
            json!({"id": i, "name": name, "email": format!("c{i}@example.com"), "job": "Sales"})
        })
        .collect()
}

fn page_body(results: Vec<Value>, count: u64) -> Value {
    json!({"results": results, "count": count, "next": null, "previous": null})
}

async fn wait_for<B: Backend>(
    ctrl: &ListController<B>,
    pred: impl Fn(&ResultState) -> bool,
) -> ResultState {
    let mut rx = ctrl.subscribe_results();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = rx.borrow_and_update().clone();
            if pred(&state) {
                return state;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap()
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_forty_records_make_two_pages() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(applicants(1..=25), 40)))
        .mount(&server)
        .await;

    let ctrl = ListController::new(&APPLICANTS, client, Session::anonymous());
    assert_eq!(ctrl.results().view(), ViewState::Loading);

    assert_eq!(ctrl.load().await, FetchOutcome::Applied);
    let state = ctrl.results();
    let rs = state.result.as_ref().unwrap();
    assert_eq!(rs.items.len(), 25);
    assert_eq!(rs.total_count, 40);
    assert_eq!(state.total_pages(), 2);
    assert!(!ctrl.busy().is_busy());
}

#[tokio::test]
async fn test_search_returns_to_page_one_and_filters_loaded_page() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(applicants(1..=25), 40)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(applicants(26..=40), 40)))
        .mount(&server)
        .await;

    let ctrl = ListController::new(&APPLICANTS, client, Session::anonymous());
    ctrl.start().await;
    wait_for(&ctrl, |s| s.result.is_some()).await;

    assert_eq!(ctrl.set_page(2), 2);
    wait_for(&ctrl, |s| s.result.as_ref().is_some_and(|r| r.page == 2)).await;
    assert_eq!(ctrl.visible_items().len(), 15);

    ctrl.set_search("ravi").unwrap();
    assert_eq!(ctrl.query().page, 1);
    wait_for(&ctrl, |s| s.result.as_ref().is_some_and(|r| r.page == 1)).await;

    let visible = ctrl.visible_items();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].text("name"), "Ravi Kumar");

    ctrl.shutdown().await;
}

#[tokio::test]
async fn test_paging_waits_for_the_new_filter_result() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .and(query_param_is_missing("stage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(applicants(1..=25), 40)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .and(query_param("stage", "Round1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(applicants(1..=5), 5)))
        .mount(&server)
        .await;

    let ctrl = ListController::new(&APPLICANTS, client, Session::anonymous());
    assert_eq!(ctrl.load().await, FetchOutcome::Applied);
    assert_eq!(ctrl.total_pages(), 2);

    // The two pages belong to the unfiltered list, not to Round1.
    ctrl.set_filter("stage", Some("Round1".into())).unwrap();
    assert_eq!(ctrl.next_page(), 1);
    assert_eq!(ctrl.set_page(2), 1);

    assert_eq!(ctrl.load().await, FetchOutcome::Applied);
    assert_eq!(ctrl.total_pages(), 1);
    assert_eq!(ctrl.next_page(), 1);

    ctrl.set_filter("stage", None).unwrap();
    assert_eq!(ctrl.next_page(), 1);
    assert_eq!(ctrl.load().await, FetchOutcome::Applied);
    assert_eq!(ctrl.next_page(), 2);
    assert_eq!(ctrl.query().page, 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_results_and_reports_server_error() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/product/finished-goods/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![json!({"id": 1, "name": "Tape"})],
            1,
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/product/finished-goods/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctrl = ListController::new(&FINISHED_GOODS, client, Session::anonymous());
    assert_eq!(ctrl.load().await, FetchOutcome::Applied);
    let outcome = ctrl.load().await;
    assert_eq!(outcome, FetchOutcome::Failed(SERVER_ERROR_MESSAGE.to_owned()));

    let state = ctrl.results();
    assert_eq!(state.result.unwrap().items.len(), 1);
    assert_eq!(state.error.as_deref(), Some(SERVER_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_unreachable_backend_shows_access_message() {
    let client = ErpClient::with_client("http://127.0.0.1:9/", reqwest::Client::new()).unwrap();
    let ctrl = ListController::new(&FINISHED_GOODS, Arc::new(client), Session::anonymous());
    let outcome = ctrl.load().await;
    assert_eq!(outcome, FetchOutcome::Failed(NO_RESPONSE_MESSAGE.to_owned()));
    assert_eq!(ctrl.results().view(), ViewState::Failed);
}

// ── Stale responses ─────────────────────────────────────────────────

/// Answers each search after a delay chosen by the search text.
struct SlowBackend {
    completed: Mutex<Vec<String>>,
}

impl Backend for SlowBackend {
    async fn list_page(&self, _: &str, query: &ListQuery) -> Result<Page<Record>, CoreError> {
        let search = query.search.clone().unwrap_or_default();
        let delay = match search.as_str() {
            "a" => 300,
            _ => 10,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.completed.lock().unwrap().push(search.clone());
        let item = Record::try_from(json!({"id": 1, "name": search})).unwrap();
        Ok(Page {
            results: vec![item],
            count: 1,
            next: None,
            previous: None,
        })
    }

    async fn list_all(&self, _: &str, _: &ListQuery) -> Result<Vec<Record>, CoreError> {
        Ok(Vec::new())
    }

    async fn get(&self, _: &str, _: &[(String, String)]) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn post(&self, _: &str, _: &Value) -> Result<Value, CoreError> {
        unreachable!()
    }

    async fn patch(&self, _: &str, _: &Value) -> Result<Value, CoreError> {
        unreachable!()
    }
}

#[tokio::test(start_paused = true)]
async fn test_late_response_for_older_query_is_discarded() {
    let backend = Arc::new(SlowBackend {
        completed: Mutex::new(Vec::new()),
    });
    let ctrl = ListController::new(&FINISHED_GOODS, Arc::clone(&backend), Session::anonymous());
    ctrl.start().await;
    wait_for(&ctrl, |s| s.result.is_some()).await;

    ctrl.set_search("a").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    ctrl.set_search("ab").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    // "a" finished last but must not overwrite "ab".
    assert_eq!(*backend.completed.lock().unwrap(), vec!["", "ab", "a"]);
    let state = ctrl.results();
    assert_eq!(state.result.unwrap().items[0].text("name"), "ab");
    assert!(!state.loading);
    assert!(!ctrl.busy().is_busy());

    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_issues_one_fetch() {
    let backend = Arc::new(SlowBackend {
        completed: Mutex::new(Vec::new()),
    });
    let ctrl = ListController::new(&FINISHED_GOODS, Arc::clone(&backend), Session::anonymous());
    ctrl.start().await;
    wait_for(&ctrl, |s| s.result.is_some()).await;

    for text in ["t", "ta", "tap", "tape"] {
        ctrl.set_search(text).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(*backend.completed.lock().unwrap(), vec!["", "tape"]);

    ctrl.shutdown().await;
}

// ── Editing ─────────────────────────────────────────────────────────

fn vendor_7() -> Value {
    json!({
        "id": 7, "type": "Domestic", "name": "Acme", "pan_number": "ABCDE1234F",
        "gst_number": "07AAAAA0000A1Z5", "country": "India"
    })
}

#[tokio::test]
async fn test_new_records_start_assigned_to_the_signed_in_user() {
    let (_server, client) = setup().await;
    let session = Session::new(UserProfile {
        email: "asha@example.com".into(),
        ..UserProfile::default()
    });

    let companies = ListController::new(&COMPANIES, Arc::clone(&client), Arc::clone(&session));
    let draft = companies.new_record().unwrap();
    assert!(draft.is_open());
    assert_eq!(draft.draft().unwrap()["assigned_to"], json!("asha@example.com"));

    // No owner field, nothing stamped.
    let vendors = ListController::new(&VENDORS, Arc::clone(&client), session);
    let draft = vendors.new_record().unwrap();
    assert!(draft.draft().unwrap().get("assigned_to").is_none());

    let anonymous = ListController::new(&COMPANIES, client, Session::anonymous());
    let draft = anonymous.new_record().unwrap();
    let owner = draft.draft().unwrap().get("assigned_to").and_then(Value::as_str);
    assert!(owner.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_cancel_makes_no_backend_call() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/vendor/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![vendor_7()], 1)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctrl = ListController::new(&VENDORS, client, Session::anonymous());
    ctrl.load().await;
    let record = Arc::new(ctrl.visible_items().remove(0));

    let mut session = ctrl.editor().unwrap();
    session.open_update(Arc::clone(&record));
    session.set_field("name", "Renamed").unwrap();
    session.cancel();

    assert!(!session.is_open());
    assert_eq!(ctrl.visible_items()[0].text("name"), "Acme");
}

#[tokio::test]
async fn test_rejected_save_keeps_session_open_with_field_errors() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/vendor/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![vendor_7()], 1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/inventory/vendor/7/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": {"pan_number": ["required"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = ListController::new(&VENDORS, client, Session::anonymous());
    ctrl.load().await;
    let mut session = ctrl.editor().unwrap();
    session.open_update(Arc::new(ctrl.visible_items().remove(0)));
    session.set_field("name", "Acme Tapes").unwrap();

    let err = ctrl.save(&mut session).await.unwrap_err();
    assert_eq!(err.user_message(), "pan_number: required");
    assert!(session.is_open());
    assert_eq!(session.draft().unwrap()["name"], json!("Acme Tapes"));

    let mut queue = ErrorQueue::new();
    queue.report(&err);
    assert_eq!(queue.current(), Some("pan_number: required"));
}

#[tokio::test]
async fn test_successful_save_closes_and_refreshes() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/vendor/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![vendor_7()], 1)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/inventory/vendor/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendor_7()))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = ListController::new(&VENDORS, client, Session::anonymous());
    ctrl.load().await;
    let mut session = ctrl.editor().unwrap();
    session.open_update(Arc::new(ctrl.visible_items().remove(0)));
    session.set_field("website", "https://acme.example").unwrap();

    let saved = ctrl.save(&mut session).await.unwrap();
    assert!(!saved.created);
    assert!(!session.is_open());

    // The refresh runs in the background; wait for the busy flag to drop.
    let mut busy = ctrl.busy().subscribe();
    tokio::time::timeout(Duration::from_secs(5), busy.wait_for(|b| !*b))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_local_validation_failures_never_reach_backend() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let ctrl = ListController::new(&VENDORS, Arc::clone(&client), Session::anonymous());
    let mut vendor = ctrl.editor().unwrap();
    vendor.open_create();
    vendor.set_field("pan_number", "ABCDE1234F").unwrap();
    vendor.set_field("gst_number", "07AAAAA0000A1Z5XX").unwrap();
    let err = ctrl.save(&mut vendor).await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "gst_number: GST NO should be less than or equal to 15 Digit"
    );

    let mut assign = EditSession::new(&BULK_ASSIGN_FORM);
    assign.open_create();
    assign.set_field("assign_from", "a@example.com").unwrap();
    assign.set_field("assign_to", "a@example.com").unwrap();
    let err = assign.save(client.as_ref()).await.unwrap_err();
    assert!(err.is_local());
    assert!(assign.is_open());
}

// ── Company tabs ────────────────────────────────────────────────────

#[tokio::test]
async fn test_company_tabs_load_and_save_on_their_own_paths() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/company/12/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12, "name": "Acme"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customer/company/12/bank/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "bank_name": "SBI", "current_account_no": "0012",
            "ifsc_code": "SBIN0000001", "branch": "Delhi"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/customer/company/12/bank/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "branch": "Pune"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/customer/company/12/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut tabs = TabbedSession::new(RecordId::Number(12));
    tabs.load(client.as_ref(), CompanyTab::Company).await.unwrap();
    tabs.active_session_mut().set_field("name", "Acme Ltd").unwrap();

    tabs.switch(CompanyTab::Bank);
    tabs.load(client.as_ref(), CompanyTab::Bank).await.unwrap();
    tabs.active_session_mut().set_field("branch", "Pune").unwrap();

    // Already open: no second GET, and the draft stays.
    tabs.load(client.as_ref(), CompanyTab::Bank).await.unwrap();
    assert_eq!(tabs.active_session().draft().unwrap()["branch"], json!("Pune"));

    let saved = tabs.save_active(client.as_ref()).await.unwrap();
    assert!(!saved.created);
    assert!(!tabs.session(CompanyTab::Bank).is_open());
    assert!(tabs.session(CompanyTab::Company).is_open());
    assert_eq!(tabs.dirty_tabs(), vec![CompanyTab::Company]);
}

// ── Export ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_export_writes_every_matching_record() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/mrf-products/"))
        .and(query_param("filter_by", "today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "date": "2024-05-01", "product": "Tape", "unit": "ROLL", "quantity": 4, "branch": "Delhi"},
            {"id": 2, "date": "2024-05-01", "product": "Glue", "unit": "KG", "quantity": 1, "branch": "Pune"},
            {"id": 3, "date": "2024-05-01", "product": "Foam", "unit": "PCS", "quantity": 9, "branch": null},
        ])))
        .mount(&server)
        .await;

    let ctrl = ListController::new(&MRF_PRODUCTS, client, Session::anonymous());
    ctrl.set_filter("filter_by", Some("today".into())).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("MRF Products.csv");
    let summary = ctrl.export(&dest).await.unwrap();
    assert_eq!(summary.rows, 3);

    let text = std::fs::read_to_string(&dest).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert_eq!(text.lines().last(), Some("3,2024-05-01,Foam,PCS,9,"));
}

#[tokio::test]
async fn test_failed_export_writes_nothing() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/mrf-products/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctrl = ListController::new(&MRF_PRODUCTS, client, Session::anonymous());
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.csv");
    assert!(ctrl.export(&dest).await.is_err());
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
