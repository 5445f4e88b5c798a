/*
 * Responsibility
 * - introspection レスポンス (RFC 7662) の型
 * - `active` 以外は任意の claim なので、JSON object をそのまま保持し、よく使う claim だけ typed accessor を用意する
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims returned by the authorization server for a single token.
///
/// The mapping is kept verbatim. Only `active` has a meaning for the
/// enforcement decision; everything else is passed through to handlers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntrospectionResult(Map<String, Value>);

impl IntrospectionResult {
    /// `true` only when `active` is present and is the JSON boolean `true`.
    ///
    /// A missing claim, `null`, `"true"` or `1` are all treated as inactive.
    pub fn active(&self) -> bool {
        matches!(self.0.get("active"), Some(Value::Bool(true)))
    }

    pub fn sub(&self) -> Option<&str> {
        self.get_str("sub")
    }

    pub fn scope(&self) -> Option<&str> {
        self.get_str("scope")
    }

    /// Space-separated `scope` split into individual values.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope().into_iter().flat_map(str::split_whitespace)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().any(|s| s == scope)
    }

    /// Expiration time (seconds since the epoch), if it is an integer.
    pub fn exp(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.get_str("client_id")
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
    }

    /// Generic lookup for claims without a typed accessor.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.0
    }
}
