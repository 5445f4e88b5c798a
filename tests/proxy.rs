mod common;

use std::collections::HashMap;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use introspection_pep::app::{build_router, build_state};
use introspection_pep::config::{
    BASE_URL_KEY, Config, MAX_BODY_BYTES_KEY, TOKEN_INTROSPECTION_ENDPOINT_KEY, UPSTREAM_URL_KEY,
};
use introspection_pep::services::introspection::TokenIntrospector;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{body_string as read_body, www_authenticate};

fn app(introspection: &str, upstream: &str, extra: &[(&str, &str)]) -> Router {
    let mut vars: HashMap<String, String> = HashMap::from([
        (TOKEN_INTROSPECTION_ENDPOINT_KEY.to_string(), introspection.to_string()),
        (UPSTREAM_URL_KEY.to_string(), upstream.to_string()),
    ]);
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let state = build_state(&config).unwrap();
    build_router(state, config.http_limits())
}

#[tokio::test]
async fn authorized_request_is_forwarded_to_upstream() {
    let introspection = common::introspection_endpoint(Some(true)).await;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient/1"))
        .and(query_param("_count", "10"))
        .and(header("authorization", "Bearer yes"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-upstream", "yes")
                .set_body_string("patient"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = app(&introspection.uri(), &format!("{}/fhir", upstream.uri()), &[]);
    let response = app
        .oneshot(common::get("/Patient/1?_count=10", Some("Bearer yes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-upstream"], "yes");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(read_body(response).await, "patient");
}

#[tokio::test]
async fn request_body_and_method_are_forwarded() {
    let introspection = common::introspection_endpoint(Some(true)).await;
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Observation"))
        .and(body_string(r#"{"status":"final"}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = app(&introspection.uri(), &upstream.uri(), &[]);
    let request = Request::builder()
        .method("POST")
        .uri("/Observation")
        .header("authorization", "Bearer yes")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"status":"final"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn client_forwarding_headers_are_not_forwarded() {
    let introspection = common::introspection_endpoint(Some(true)).await;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Patient"))
        .and(header_exists("x-forwarded-for"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/Patient"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = app(&introspection.uri(), &upstream.uri(), &[]);
    let request = Request::builder()
        .uri("/Patient")
        .header("authorization", "Bearer yes")
        .header("x-forwarded-for", "203.0.113.7")
        .header("x-forwarded-host", "evil.example")
        .header("forwarded", "for=203.0.113.7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let received = upstream.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    for name in ["x-forwarded-for", "x-forwarded-host", "forwarded"] {
        assert!(!received[0].headers.contains_key(name), "{name}");
    }
}

#[tokio::test]
async fn upstream_status_is_passed_through() {
    let introspection = common::introspection_endpoint(Some(true)).await;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&upstream)
        .await;

    let app = app(&introspection.uri(), &upstream.uri(), &[]);
    let response = app
        .oneshot(common::get("/missing", Some("Bearer yes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(response).await, "not here");
}

#[tokio::test]
async fn unauthorized_request_never_reaches_upstream() {
    let introspection = common::introspection_endpoint(Some(false)).await;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = app(
        &introspection.uri(),
        &upstream.uri(),
        &[(BASE_URL_KEY, "https://example.com/x")],
    );
    let response = app
        .oneshot(common::get("/Patient", Some("Bearer nope")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        www_authenticate(&response),
        r#"Bearer error="invalid_request", error_description="invalid/expired token", resource_metadata="https://example.com/.well-known/x""#
    );
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() {
    let introspection = common::introspection_endpoint(Some(true)).await;
    let upstream = common::unreachable_url();

    let app = app(&introspection.uri(), upstream.as_str(), &[]);
    let response = app
        .oneshot(common::get("/Patient", Some("Bearer yes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = serde_json::from_str(&read_body(response).await).unwrap();
    assert_eq!(body["error"]["code"], "BAD_GATEWAY");
    assert!(!body.to_string().contains(upstream.host_str().unwrap()));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let introspection = common::introspection_endpoint(Some(true)).await;
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = app(&introspection.uri(), &upstream.uri(), &[(MAX_BODY_BYTES_KEY, "16")]);
    let request = Request::builder()
        .method("POST")
        .uri("/Binary")
        .header("authorization", "Bearer yes")
        .body(Body::from("x".repeat(64)))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn build_state_uses_configured_urls() {
    let config = Config::from_lookup(|key| match key {
        TOKEN_INTROSPECTION_ENDPOINT_KEY => Some("http://auth.local/introspect".into()),
        UPSTREAM_URL_KEY => Some("http://upstream.local/fhir".into()),
        _ => None,
    })
    .unwrap();

    let state = build_state(&config).unwrap();

    assert_eq!(
        state.enforcement.introspector.endpoint(),
        "http://auth.local/introspect"
    );
    assert_eq!(state.proxy.upstream(), &Url::parse("http://upstream.local/fhir").unwrap());
    assert!(state.enforcement.base_url.is_none());
}
