//! bearer token を introspection で検証 → claims を extensions に入れる
//!
//! 判定の順序 (最初の失敗で打ち切り):
//! 1. `Authorization` header の parse 失敗 → 401 `invalid_request` (parser のメッセージ)
//! 2. introspection の失敗 → 401 `server_error` (原因はログにのみ出す)
//! 3. `active` が true でない → 401 `invalid_request`
//! 4. それ以外 → `IntrospectionResult` を extensions に入れて next へ
//!
//! 結果はキャッシュしない。リクエストごとに introspection を行う。
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use url::Url;

use super::challenge::{AuthorizationChallenge, ErrorCode};
use super::header::{HeaderError, parse_authorization_header};
use crate::services::introspection::{IntrospectionError, IntrospectionResult, TokenIntrospector};

/// Read-only enforcement settings, shared by all requests.
pub struct EnforcementConfig {
    pub introspector: Arc<dyn TokenIntrospector>,
    /// Enables `resource_metadata` in challenges.
    pub base_url: Option<Url>,
}

impl EnforcementConfig {
    pub fn new(introspector: Arc<dyn TokenIntrospector>, base_url: Option<Url>) -> Self {
        Self {
            introspector,
            base_url,
        }
    }
}

impl std::fmt::Debug for EnforcementConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnforcementConfig")
            .field("introspection_endpoint", &self.introspector.endpoint())
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Why a request was not forwarded.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("token introspection failed: {0}")]
    Introspection(#[from] IntrospectionError),
    #[error("invalid/expired token")]
    TokenInactive,
}

impl Rejection {
    /// Caller-facing challenge. Introspection details are replaced by a fixed message.
    pub fn challenge(&self) -> AuthorizationChallenge {
        match self {
            Rejection::Header(e) => {
                AuthorizationChallenge::new(ErrorCode::InvalidRequest, e.to_string())
            }
            Rejection::Introspection(_) => {
                AuthorizationChallenge::new(ErrorCode::ServerError, "couldn't verify access token")
            }
            Rejection::TokenInactive => {
                AuthorizationChallenge::new(ErrorCode::InvalidRequest, "invalid/expired token")
            }
        }
    }
}

/// Runs the enforcement decision for one request.
///
/// Returns the introspected claims when the request may be forwarded.
pub async fn authorize(
    config: &EnforcementConfig,
    headers: &HeaderMap,
) -> Result<IntrospectionResult, Rejection> {
    let raw = match headers.get(header::AUTHORIZATION) {
        Some(value) => value.to_str().map_err(|_| HeaderError::MalformedHeader)?,
        None => "",
    };
    let (_, token) = parse_authorization_header(raw)?;

    let claims = config.introspector.introspect(token).await?;

    if !claims.active() {
        return Err(Rejection::TokenInactive);
    }

    Ok(claims)
}

/// Puts every route of `router` (fallback included) behind token enforcement.
///
/// 例：
/// ```ignore
/// let router = Router::new().fallback(proxy);
/// let router = middleware::auth::enforce::apply(router, state.enforcement.clone());
/// ```
pub fn apply<S>(router: Router<S>, config: Arc<EnforcementConfig>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(config, enforce))
}

pub async fn enforce(
    State(config): State<Arc<EnforcementConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authorize(&config, req.headers()).await {
        Ok(claims) => {
            tracing::debug!(sub = ?claims.sub(), "access token accepted");

            // middleware → extractor への受け渡し
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(rejection) => {
            match &rejection {
                Rejection::Introspection(err) => tracing::error!(
                    error = ?err,
                    endpoint = config.introspector.endpoint(),
                    status = ?err.status(),
                    "failed to introspect access token"
                ),
                other => tracing::debug!(reason = %other, "request rejected"),
            }

            rejection
                .challenge()
                .with_base_url(config.base_url.as_ref())
                .into_response()
        }
    }
}
