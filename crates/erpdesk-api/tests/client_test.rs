#![allow(clippy::unwrap_used)]
// Integration tests for `ErpClient` and `PostalClient` using wiremock.

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use erpdesk_api::{ErpClient, Error, ListQuery, PostalClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ErpClient) {
    let server = MockServer::start().await;
    let client = ErpClient::with_client(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn applicants(n: u64) -> Vec<Value> {
    (1..=n)
        .map(|i| json!({"id": i, "name": format!("Candidate {i}")}))
        .collect()
}

// ── List tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_page_sends_query_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .and(query_param("page", "2"))
        .and(query_param("search", "ravi"))
        .and(query_param("stage", "Round1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": applicants(15),
            "count": 40,
            "next": null,
            "previous": format!("{}/api/hr/applicant/?page=1", server.uri()),
        })))
        .mount(&server)
        .await;

    let mut query = ListQuery {
        page: Some(2),
        search: Some("ravi".into()),
        ..ListQuery::default()
    };
    query.filters.insert("stage".into(), "Round1".into());
    query.filters.insert("status".into(), String::new());

    let page = client
        .list_page::<Value>("api/hr/applicant/", &query)
        .await
        .unwrap();
    assert_eq!(page.count, 40);
    assert_eq!(page.results.len(), 15);
    assert!(page.previous.is_some());
}

#[tokio::test]
async fn test_list_all_follows_next_links() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/inventory/mrf-products/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": applicants(5),
            "count": 30,
            "next": null,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/inventory/mrf-products/"))
        .and(query_param("filter_by", "today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": applicants(25),
            "count": 30,
            "next": format!("{}/api/inventory/mrf-products/?page=2", server.uri()),
        })))
        .mount(&server)
        .await;

    let mut query = ListQuery::default();
    query.filters.insert("filter_by".into(), "today".into());
    let rows = client
        .list_all::<Value>("api/inventory/mrf-products/", &query)
        .await
        .unwrap();
    assert_eq!(rows.len(), 30);
}

#[tokio::test]
async fn test_list_all_accepts_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/product/colour/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Red"},
            {"id": 2, "name": "Blue"},
        ])))
        .mount(&server)
        .await;

    let rows = client
        .list_all::<Value>("api/product/colour/", &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

// ── Record tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_patches_record() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/inventory/vendor/7/"))
        .and(body_json(json!({"name": "Acme"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "Acme"})))
        .mount(&server)
        .await;

    let saved: Value = client
        .update("api/inventory/vendor/", "7", &json!({"name": "Acme"}))
        .await
        .unwrap();
    assert_eq!(saved["id"], 7);
}

#[tokio::test]
async fn test_replace_puts_record() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/product/colour/3/"))
        .and(body_json(json!({"name": "Teal"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "Teal"})))
        .mount(&server)
        .await;

    let saved: Value = client
        .replace("api/product/colour/", "3", &json!({"name": "Teal"}))
        .await
        .unwrap();
    assert_eq!(saved["name"], "Teal");
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let token: secrecy::SecretString = "abc".to_string().into();
    let client = ErpClient::new(&server.uri(), Some(&token), &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/user/profile/"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.c"})))
        .mount(&server)
        .await;

    let profile: Value = client.get_json("api/user/profile/", &[]).await.unwrap();
    assert_eq!(profile["email"], "a@b.c");
}

// ── Error mapping tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_400_maps_to_validation_errors() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/inventory/vendor/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": {"pan_number": ["required"]}
        })))
        .mount(&server)
        .await;

    let result: Result<Value, _> = client
        .create("api/inventory/vendor/", &json!({"name": "x"}))
        .await;
    match result {
        Err(Error::Validation { errors }) => {
            assert_eq!(errors.first("pan_number"), Some("required"));
        }
        other => panic!("expected Validation error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_401_carries_error_code() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": {"code": "token_not_valid"}
        })))
        .mount(&server)
        .await;

    let result = client
        .list_page::<Value>("api/hr/applicant/", &ListQuery::default())
        .await;
    assert!(
        matches!(&result, Err(Error::Unauthorized { code }) if code == "token_not_valid"),
        "expected Unauthorized error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_500_maps_to_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/hr/applicant/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client
        .list_page::<Value>("api/hr/applicant/", &ListQuery::default())
        .await;
    assert!(
        matches!(result, Err(Error::Http { status: 500, .. })),
        "expected Http error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_connection_refused_is_no_response() {
    // Nothing listens on port 9 on the loopback interface.
    let client = ErpClient::with_client("http://127.0.0.1:9/", reqwest::Client::new()).unwrap();
    let err = client
        .list_page::<Value>("api/hr/applicant/", &ListQuery::default())
        .await
        .unwrap_err();
    assert!(err.is_no_response(), "expected transport error, got: {err:?}");
}

// ── Postal lookup tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_postal_lookup_reads_first_post_office() {
    let server = MockServer::start().await;
    let postal = PostalClient::with_client(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/pincode/110001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Status": "Success",
            "PostOffice": [
                {"Name": "Connaught Place", "District": "Central Delhi", "State": "Delhi"},
                {"Name": "Other", "District": "Elsewhere", "State": "Nowhere"},
            ]
        }])))
        .mount(&server)
        .await;

    let place = postal.lookup("110001").await.unwrap().unwrap();
    assert_eq!(place.state, "Delhi");
    assert_eq!(place.district, "Central Delhi");
}

#[tokio::test]
async fn test_postal_lookup_unknown_pincode() {
    let server = MockServer::start().await;
    let postal = PostalClient::with_client(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/pincode/000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Status": "Error",
            "PostOffice": null
        }])))
        .mount(&server)
        .await;

    assert!(postal.lookup("000000").await.unwrap().is_none());
}
