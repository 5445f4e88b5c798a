//! `Authorization` header parsing.
use thiserror::Error;

pub const BEARER_SCHEME: &str = "Bearer";

/// Why an `Authorization` header could not be used.
///
/// The `Display` text is sent to the caller as `error_description`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("invalid Authorization header")]
    MalformedHeader,
    #[error("unsupported token type")]
    UnsupportedScheme,
}

/// Splits a raw `Authorization` value into `(scheme, token)`.
///
/// The scheme comparison is case-sensitive. Anything after the token is ignored.
pub fn parse_authorization_header(raw: &str) -> Result<(&str, &str), HeaderError> {
    if raw.is_empty() {
        return Err(HeaderError::MissingHeader);
    }

    let mut parts = raw.split_whitespace();
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(HeaderError::MalformedHeader);
    };

    if scheme != BEARER_SCHEME {
        return Err(HeaderError::UnsupportedScheme);
    }

    Ok((scheme, token))
}
