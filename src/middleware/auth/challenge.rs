//! `WWW-Authenticate` challenge for rejected requests.
//!
//! Format:
//! `Bearer error="<e>", error_description="<d>"[, resource_metadata="<url>"]`
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use url::Url;

/// OAuth2 error codes used in challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::ServerError => "server_error",
        }
    }
}

/// Error parameters of a 401 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationChallenge {
    pub error: ErrorCode,
    pub error_description: String,
    pub resource_metadata: Option<Url>,
}

impl AuthorizationChallenge {
    pub fn new(error: ErrorCode, error_description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: error_description.into(),
            resource_metadata: None,
        }
    }

    /// Advertises the protected-resource-metadata URL derived from `base_url`.
    pub fn with_base_url(mut self, base_url: Option<&Url>) -> Self {
        self.resource_metadata = base_url.map(resource_metadata_url);
        self
    }

    pub fn header_value(&self) -> String {
        let mut params = vec![
            format!(r#"error="{}""#, escape_quotes(self.error.as_str())),
            format!(
                r#"error_description="{}""#,
                escape_quotes(&self.error_description)
            ),
        ];
        if let Some(url) = &self.resource_metadata {
            params.push(format!(r#"resource_metadata="{url}""#));
        }
        format!("Bearer {}", params.join(", "))
    }
}

impl IntoResponse for AuthorizationChallenge {
    fn into_response(self) -> Response {
        // bare challenge if the parameters are not a legal header value
        let value = HeaderValue::from_str(&self.header_value())
            .unwrap_or_else(|_| HeaderValue::from_static("Bearer"));

        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, value)],
        )
            .into_response()
    }
}

/// `<origin>/.well-known/<base path>` for the configured base URL.
pub fn resource_metadata_url(base_url: &Url) -> Url {
    let resource_path = base_url.path().trim_matches('/');

    let mut url = base_url.clone();
    if resource_path.is_empty() {
        url.set_path("/.well-known");
    } else {
        url.set_path(&format!("/.well-known/{resource_path}"));
    }
    url.set_query(None);
    url.set_fragment(None);
    // never fails for http(s) URLs, which always have a host
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}
