#![allow(clippy::unwrap_used)]
// Integration tests for `ZpaClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zpa_api::models::{Condition, Operand, PolicyRule};
use zpa_api::{Credentials, Error, RetryPolicy, TransportConfig, ZpaClient};

// ── Helpers ─────────────────────────────────────────────────────────

const CUSTOMER: &str = "216196257331281920";

fn customer_path(suffix: &str) -> String {
    format!("/mgmtconfig/v1/admin/customers/{CUSTOMER}/{suffix}")
}

fn fast_retry(max_retries: u32) -> TransportConfig {
    TransportConfig {
        retry: RetryPolicy {
            max_retries,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        },
        ..TransportConfig::default()
    }
}

fn client_for(server: &MockServer, transport: &TransportConfig) -> ZpaClient {
    let credentials = Credentials {
        client_id: "client-abc".into(),
        client_secret: "s3cret".to_string().into(),
        customer_id: CUSTOMER.into(),
    };
    ZpaClient::with_base_url(&server.uri(), credentials, transport).unwrap()
}

async fn mount_signin(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/signin"))
        .and(body_string_contains("client_id=client-abc"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "tok-1",
            "expires_in": "3600"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn setup() -> (MockServer, ZpaClient) {
    let server = MockServer::start().await;
    let client = client_for(&server, &fast_retry(2));
    (server, client)
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_token_is_cached_across_calls() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/42")))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "name": "web",
            "enabled": true,
            "applications": []
        })))
        .expect(2)
        .mount(&server)
        .await;

    let first = client.get_segment_group("42").await.unwrap();
    let second = client.get_segment_group("42").await.unwrap();
    assert_eq!(first.name, "web");
    assert!(second.enabled);
}

#[tokio::test]
async fn test_signin_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/signin"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid client"))
        .mount(&server)
        .await;

    let result = client.get_segment_group("42").await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_expired_token_triggers_one_new_signin() {
    let (server, client) = setup().await;
    mount_signin(&server, 2).await;

    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/42")))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/42")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42", "name": "web"})))
        .mount(&server)
        .await;

    let group = client.get_segment_group("42").await.unwrap();
    assert_eq!(group.id, "42");
}

#[tokio::test]
async fn test_persistent_unauthorized_is_invalid_credentials() {
    let (server, client) = setup().await;
    mount_signin(&server, 2).await;

    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/42")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.get_segment_group("42").await;
    assert!(matches!(result, Err(Error::InvalidCredentials)), "got: {result:?}");
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(customer_path("application/404404")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(customer_path("application/400400")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "id": "resource.not.found",
            "reason": "Application 400400 does not exist"
        })))
        .mount(&server)
        .await;

    let err = client.get_application_segment("404404").await.unwrap_err();
    assert!(err.is_not_found(), "got: {err:?}");

    let err = client.get_application_segment("400400").await.unwrap_err();
    assert!(err.is_not_found(), "got: {err:?}");
    assert_eq!(err.api_error_code(), Some("resource.not.found"));
}

#[tokio::test]
async fn test_api_error_keeps_reason_and_code() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(customer_path("segmentGroup")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "id": "duplicate.name",
            "reason": "Segment group with name web already exists"
        })))
        .mount(&server)
        .await;

    let group = zpa_api::models::SegmentGroup {
        name: "web".into(),
        ..Default::default()
    };
    let result = client.create_segment_group(&group).await;
    match result {
        Err(Error::Api {
            status,
            message,
            code,
        }) => {
            assert_eq!(status, 400);
            assert!(message.contains("already exists"));
            assert_eq!(code.as_deref(), Some("duplicate.name"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_lookup_by_name_miss() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup")))
        .and(query_param("search", "nope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalPages": "1",
            "list": [{"id": "1", "name": "nope-but-longer"}]
        })))
        .mount(&server)
        .await;

    let result = client.get_segment_group_by_name("nope").await;
    assert!(
        matches!(result, Err(Error::NotFound { resource: "segment group", .. })),
        "got: {result:?}"
    );
}

// ── Rate limiting ───────────────────────────────────────────────────

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/7")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/7")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "7", "name": "ops"})))
        .mount(&server)
        .await;

    let group = client.get_segment_group("7").await.unwrap();
    assert_eq!(group.name, "ops");
}

#[tokio::test]
async fn test_rate_limit_budget_exhausted() {
    let server = MockServer::start().await;
    let client = client_for(&server, &fast_retry(0));
    mount_signin(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/7")))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = client.get_segment_group("7").await;
    assert!(matches!(result, Err(Error::RateLimited { .. })), "got: {result:?}");
}

// ── Scoping & pagination ────────────────────────────────────────────

#[tokio::test]
async fn test_microtenant_scope_adds_query_param() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(customer_path("segmentGroup/9")))
        .and(query_param("microtenantId", "mt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "9",
            "name": "tenant-group",
            "microtenantId": "mt-1"
        })))
        .mount(&server)
        .await;

    let scoped = client.scoped(Some(" mt-1 "));
    assert_eq!(scoped.microtenant_id(), Some("mt-1"));
    let group = scoped.get_segment_group("9").await.unwrap();
    assert_eq!(group.microtenant_id, "mt-1");

    assert_eq!(client.scoped(Some("  ")).microtenant_id(), None);
}

#[tokio::test]
async fn test_policy_rules_are_paged() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    let rules_path = customer_path("policySet/rules/policyType/ACCESS_POLICY");
    Mock::given(method("GET"))
        .and(path(rules_path.clone()))
        .and(query_param("page", "1"))
        .and(query_param("pagesize", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalPages": "2",
            "list": [{"id": "r1", "name": "first", "conditions": []}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(rules_path))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalPages": "2",
            "list": [{"id": "r2", "name": "second", "conditions": []}]
        })))
        .mount(&server)
        .await;

    let rules = client.list_policy_rules("ACCESS_POLICY").await.unwrap();
    let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["r1", "r2"]);
}

#[tokio::test]
async fn test_update_policy_rule_sends_conditions() {
    let (server, client) = setup().await;
    mount_signin(&server, 1).await;

    Mock::given(method("PUT"))
        .and(path(customer_path("policySet/ps-1/rule/r1")))
        .and(body_partial_json(json!({
            "id": "r1",
            "conditions": [{"operands": [{"objectType": "APP", "lhs": "id", "rhs": "5"}]}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let rule = PolicyRule {
        id: "r1".into(),
        name: "allow".into(),
        conditions: vec![Condition {
            operands: vec![Operand {
                object_type: "APP".into(),
                lhs: "id".into(),
                rhs: "5".into(),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    client.update_policy_rule("ps-1", "r1", &rule).await.unwrap();
}
