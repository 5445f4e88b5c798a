//! Reverse proxy to the upstream API.
//!
//! Responsibility:
//! - Rewrite the request target onto the upstream URL (path joined, query kept)
//! - Forward method / headers / body, stream the upstream response back
//! - Request logging (info per request, header dumps at debug)
//!
//! Notes:
//! - Hop-by-hop headers are dropped in both directions.
//! - The request body is buffered (bounded by `max_body_bytes`); the response is streamed.
use std::error::Error as StdError;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, Request, Uri, header},
    response::Response,
};
use http_body_util::LengthLimitError;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
    #[error("request body could not be read: {0}")]
    Body(#[source] axum::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct UpstreamProxy {
    upstream: Url,
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl UpstreamProxy {
    pub fn new(upstream: Url, client: reqwest::Client, max_body_bytes: usize) -> Self {
        Self {
            upstream,
            client,
            max_body_bytes,
        }
    }

    /// Builds a dedicated client that does not follow redirects; they are passed
    /// back to the caller as-is.
    pub fn with_timeout(
        upstream: Url,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::new(upstream, client, max_body_bytes))
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    pub fn target_url(&self, uri: &Uri) -> Url {
        rewrite_target(&self.upstream, uri.path(), uri.query())
    }

    pub async fn forward(&self, req: Request<Body>) -> Result<Response, ProxyError> {
        let (parts, body) = req.into_parts();
        let target = self.target_url(&parts.uri);

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|err| {
                if is_length_limit(&err) {
                    ProxyError::BodyTooLarge {
                        limit: self.max_body_bytes,
                    }
                } else {
                    ProxyError::Body(err)
                }
            })?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        // reqwest derives Host from the target URL
        headers.remove(header::HOST);
        strip_forwarding(&mut headers);

        tracing::info!(method = %parts.method, url = %target, "proxying request");
        tracing::debug!(headers = ?headers, "proxy request headers");

        let upstream = self
            .client
            .request(parts.method, target.clone())
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(error = ?err, url = %target, "proxied request failed");
                ProxyError::Upstream(err)
            })?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        tracing::debug!(status = %status, headers = ?headers, "proxied request response");

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Drops client-supplied `Forwarded` / `X-Forwarded-*` headers.
pub fn strip_forwarding(headers: &mut HeaderMap) {
    headers.remove(header::FORWARDED);
    for name in ["x-forwarded-for", "x-forwarded-host", "x-forwarded-proto"] {
        headers.remove(name);
    }
}

/// Joins `path` onto the upstream path with a single `/` and replaces the query.
pub fn rewrite_target(upstream: &Url, path: &str, query: Option<&str>) -> Url {
    let base = upstream.path().trim_end_matches('/');
    let tail = path.trim_start_matches('/');

    let mut target = upstream.clone();
    target.set_path(&format!("{base}/{tail}"));
    target.set_query(query);
    target.set_fragment(None);
    target
}

/// Removes connection-scoped headers, including those named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    for name in [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        HeaderName::from_static("keep-alive"),
        HeaderName::from_static("proxy-connection"),
    ] {
        headers.remove(name);
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err as &(dyn StdError + 'static));
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
