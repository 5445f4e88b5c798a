/*
 * Responsibility
 * - 全パスの fallback handler: 認証済みリクエストを upstream へ転送する
 * - enforcement middleware の内側でのみ呼ばれる (Claims が無ければ 401)
 */
use axum::{body::Body, extract::State, http::Request, response::Response};

use crate::api::extractors::Claims;
use crate::error::AppError;
use crate::state::AppState;

pub async fn forward(
    State(state): State<AppState>,
    Claims(claims): Claims,
    req: Request<Body>,
) -> Result<Response, AppError> {
    tracing::debug!(
        sub = ?claims.sub(),
        client_id = ?claims.client_id(),
        "forwarding authorized request"
    );

    Ok(state.proxy.forward(req).await?)
}
