#![allow(clippy::unwrap_used)]
// Integration tests for `RequestExecutor` using wiremock: retry bounds,
// endpoint rotation, marker discrimination, and header decoration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil_api::executor::{CAPACITY_MARKER, INVALID_SESSION_MARKER};
use vigil_api::{
    ApiRequest, EndpointSet, Error, RequestExecutor, RetryPolicy, TokenStore, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        base_delay: Duration::from_millis(5),
    }
}

fn executor_for(uris: &[String]) -> (RequestExecutor, Arc<EndpointSet>, Arc<TokenStore>) {
    let hosts = uris.iter().map(|u| Url::parse(u).unwrap()).collect();
    let endpoints = Arc::new(EndpointSet::new(hosts).unwrap());
    let tokens = Arc::new(TokenStore::new());
    let executor = RequestExecutor::new(
        &TransportConfig::default(),
        Arc::clone(&endpoints),
        Arc::clone(&tokens),
        CancellationToken::new(),
    )
    .unwrap()
    .with_policy(fast_policy());
    (executor, endpoints, tokens)
}

// ── Retry bound ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_gives_up_after_three_attempts() {
    let server = MockServer::start().await;

    // Every attempt times out; the per-request budget is far below the
    // mock delay, so each attempt counts as a transport failure.
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&server)
        .await;

    let (executor, _, _) = executor_for(&[server.uri()]);
    let request = ApiRequest::get("/data").with_timeout(Duration::from_millis(100));

    let result = executor.execute(&request).await;

    match result {
        Err(Error::Transport(e)) => assert!(e.is_timeout(), "expected timeout, got: {e:?}"),
        other => panic!("expected Transport error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let server = MockServer::start().await;

    // First two attempts time out, the third lands inside the budget.
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("late but fine"))
        .expect(1)
        .mount(&server)
        .await;

    let (executor, _, _) = executor_for(&[server.uri()]);
    let request = ApiRequest::get("/data").with_timeout(Duration::from_millis(100));

    let response = executor.execute(&request).await.unwrap();
    assert_eq!(response.body, "late but fine");
}

// ── Endpoint rotation ───────────────────────────────────────────────

#[tokio::test]
async fn test_capacity_marker_rotates_to_next_endpoint() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("{{\"code\":\"{CAPACITY_MARKER}\"}}")),
        )
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("real payload"))
        .expect(1)
        .mount(&secondary)
        .await;

    let (executor, endpoints, _) = executor_for(&[primary.uri(), secondary.uri()]);

    let response = executor.execute(&ApiRequest::get("/data")).await.unwrap();

    assert_eq!(response.body, "real payload");
    let secondary_url = Url::parse(&secondary.uri()).unwrap();
    assert_eq!(endpoints.current().port(), secondary_url.port());
}

#[tokio::test]
async fn test_capacity_on_every_endpoint_fails() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    for server in [&primary, &secondary] {
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("{{\"code\":\"{CAPACITY_MARKER}\"}}")),
            )
            .mount(server)
            .await;
    }

    let (executor, _, _) = executor_for(&[primary.uri(), secondary.uri()]);

    let result = executor.execute(&ApiRequest::get("/data")).await;
    assert!(
        matches!(result, Err(Error::Capacity { endpoints: 2 })),
        "expected Capacity error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_misdirected_status_rotates() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(421))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("owned here"))
        .expect(1)
        .mount(&secondary)
        .await;

    let (executor, _, _) = executor_for(&[primary.uri(), secondary.uri()]);

    let response = executor.execute(&ApiRequest::get("/data")).await.unwrap();
    assert_eq!(response.body, "owned here");
}

// ── Session rejection ───────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_session_marker_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("{{\"code\":\"{INVALID_SESSION_MARKER}\"}}")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (executor, _, _) = executor_for(&[server.uri()]);

    let result = executor.execute(&ApiRequest::get("/data")).await;
    assert!(
        matches!(result, Err(Error::SessionInvalid)),
        "expected SessionInvalid, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_401_is_session_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (executor, _, _) = executor_for(&[server.uri()]);

    let result = executor.execute(&ApiRequest::get("/data")).await;
    assert!(matches!(result, Err(Error::SessionInvalid)));
}

// ── Header decoration & harvesting ──────────────────────────────────

#[tokio::test]
async fn test_stored_cookies_decorate_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("Cookie", "vgsession=s1; vgaccess=a1"))
        .and(header("X-CSRF-Token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let (executor, _, tokens) = executor_for(&[server.uri()]);
    tokens.set(vigil_api::token_store::SESSION_COOKIE, "s1");
    tokens.set(vigil_api::token_store::ACCESS_COOKIE, "a1");
    tokens.set(vigil_api::token_store::CSRF_TOKEN, "tok");

    let response = executor.execute(&ApiRequest::get("/data")).await.unwrap();
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_set_cookie_headers_are_harvested() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "vgsession=fresh; Path=/; HttpOnly")
                .append_header("Set-Cookie", "vgaccess=grant")
                .set_body_json(json!({"status": "ok"})),
        )
        .mount(&server)
        .await;

    let (executor, _, tokens) = executor_for(&[server.uri()]);
    executor
        .execute(&ApiRequest::post("/auth/login", json!({})))
        .await
        .unwrap();

    assert_eq!(tokens.get("vgsession").as_deref(), Some("fresh"));
    assert_eq!(tokens.get("vgaccess").as_deref(), Some("grant"));
}

// ── Cancellation ────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancellation_aborts_retry_loop() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let endpoints = Arc::new(
        EndpointSet::new(vec![Url::parse("http://127.0.0.1:9/").unwrap()]).unwrap(),
    );
    let executor = RequestExecutor::new(
        &TransportConfig::default(),
        endpoints,
        Arc::new(TokenStore::new()),
        cancel,
    )
    .unwrap()
    .with_policy(fast_policy());

    let result = executor.execute(&ApiRequest::get("/data")).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}

// ── Query envelope ──────────────────────────────────────────────────

#[tokio::test]
async fn test_post_graphql_unwraps_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "installation": { "broadband": { "connected": true } } }
        })))
        .mount(&server)
        .await;

    let (executor, _, _) = executor_for(&[server.uri()]);
    let data = executor
        .post_graphql(&vigil_api::query::broadband("inst-1"))
        .await
        .unwrap();

    assert_eq!(
        data["installation"]["broadband"]["connected"],
        serde_json::Value::Bool(true)
    );
}

#[tokio::test]
async fn test_post_graphql_surfaces_error_array() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "unknown installation" }]
        })))
        .mount(&server)
        .await;

    let (executor, _, _) = executor_for(&[server.uri()]);
    let result = executor
        .post_graphql(&vigil_api::query::arm_state("nope"))
        .await;

    match result {
        Err(Error::Api { ref message }) => assert!(message.contains("unknown installation")),
        other => panic!("expected Api error, got: {other:?}"),
    }
}
