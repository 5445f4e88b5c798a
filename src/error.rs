/*
 * Responsibility
 * - アプリ共通の AppError 定義 (401 challenge 以外の失敗)
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - ProxyError を HTTP status に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::proxy::ProxyError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("upstream request failed")]
    BadGateway,
    #[error("upstream request timed out")]
    GatewayTimeout,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, *code),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::BadGateway => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            AppError::GatewayTimeout => (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT"),
        };
        let message = match self {
            AppError::BadRequest { message, .. } => message,
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProxyError> for AppError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::BodyTooLarge { .. } => AppError::PayloadTooLarge,
            // Client went away or sent a broken body
            ProxyError::Body(_) => {
                AppError::bad_request("INVALID_BODY", "request body could not be read")
            }
            // Upstream details stay in the logs
            ProxyError::Upstream(err) if err.is_timeout() => AppError::GatewayTimeout,
            ProxyError::Upstream(_) => AppError::BadGateway,
        }
    }
}
