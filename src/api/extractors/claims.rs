/*
 * Responsibility
 * - Handler から introspection 済みの claims を受け取るための extractor
 * - enforcement middleware が `IntrospectionResult` を request.extensions() に insert 済みである前提
 * - 見つからない場合は 401 を返す (middleware が掛かっていない)
 */
use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::introspection::IntrospectionResult;

/// Claims of the caller, as returned by the introspection endpoint.
#[derive(Debug, Clone)]
pub struct Claims(pub IntrospectionResult);

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IntrospectionResult>()
            .cloned()
            .map(Claims)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    #[tokio::test]
    async fn reads_claims_from_extensions() {
        let claims: IntrospectionResult =
            serde_json::from_value(json!({"active": true, "sub": "123"})).unwrap();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(claims.clone());

        let Claims(extracted) = Claims::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(extracted, claims);
    }

    #[tokio::test]
    async fn missing_claims_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();

        let rejection = Claims::from_request_parts(&mut parts, &()).await.unwrap_err();

        assert_eq!(rejection, StatusCode::UNAUTHORIZED);
    }
}
