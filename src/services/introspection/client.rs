//! Token introspection client (RFC 7662).
//!
//! Responsibility:
//! - POST `token=<value>` (form-encoded) to the configured introspection endpoint
//! - Decode the JSON object into `IntrospectionResult`
//!
//! Notes:
//! - No retries and no timeout policy here. Both belong to the `reqwest::Client`
//!   that is handed in (see `HttpIntrospector::with_timeout`).
//! - Interpreting `active` is the caller's job.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use thiserror::Error;
use url::Url;

use super::IntrospectionResult;

/// Introspection-layer errors.
///
/// These are logged with full detail by the enforcement middleware but never
/// shown to the caller.
#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("http error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("http status: {}", .status.as_u16())]
    Rejected { status: StatusCode },
    #[error("json decode error: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

impl IntrospectionError {
    /// Upstream HTTP status, when the endpoint answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::MalformedResponse(_) => None,
        }
    }
}

/// Introspects `token` against `endpoint` using `client`.
pub async fn introspect(
    token: &str,
    endpoint: &Url,
    client: &reqwest::Client,
) -> Result<IntrospectionResult, IntrospectionError> {
    let response = client
        .post(endpoint.clone())
        .header(header::ACCEPT, "application/json")
        .form(&[("token", token)])
        .send()
        .await
        .map_err(IntrospectionError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(IntrospectionError::Rejected { status });
    }

    let body = response
        .bytes()
        .await
        .map_err(IntrospectionError::Transport)?;

    serde_json::from_slice(&body).map_err(IntrospectionError::MalformedResponse)
}

/// Seam between the enforcement middleware and the authorization server.
///
/// Implementations must be cheap to share (`Arc<dyn TokenIntrospector>`).
#[async_trait]
pub trait TokenIntrospector: Send + Sync + 'static {
    /// Endpoint description used in logs.
    fn endpoint(&self) -> &str;

    async fn introspect(&self, token: &str) -> Result<IntrospectionResult, IntrospectionError>;
}

/// `TokenIntrospector` backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpIntrospector {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpIntrospector {
    pub fn new(endpoint: Url, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    /// Builds a dedicated client whose total request time is bounded by `timeout`.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(endpoint, client))
    }
}

#[async_trait]
impl TokenIntrospector for HttpIntrospector {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn introspect(&self, token: &str) -> Result<IntrospectionResult, IntrospectionError> {
        introspect(token, &self.endpoint, &self.client).await
    }
}
