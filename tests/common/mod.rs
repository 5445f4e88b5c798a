#![allow(dead_code)]

use axum::{body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use serde_json::{Map, Value, json};
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Introspection endpoint answering every POST with `{"active": <active>, "sub": "123"}`.
/// `None` leaves `active` out of the response.
pub async fn introspection_endpoint(active: Option<bool>) -> MockServer {
    let server = MockServer::start().await;

    let mut body = Map::new();
    if let Some(active) = active {
        body.insert("active".into(), json!(active));
    }
    body.insert("sub".into(), json!("123"));

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Object(body)))
        .mount(&server)
        .await;

    server
}

/// URL nothing listens on.
pub fn unreachable_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/")).unwrap()
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn www_authenticate(response: &Response) -> &str {
    response.headers()["www-authenticate"].to_str().unwrap()
}
