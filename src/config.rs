/*
 * Responsibility
 * - 環境変数の読み込み (introspection endpoint, upstream URL, listen address, base URL など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::middleware::http::HttpLimits;

pub const LISTEN_ADDRESS_KEY: &str = "PEP_LISTEN_ADDRESS";
pub const TOKEN_INTROSPECTION_ENDPOINT_KEY: &str = "PEP_TOKEN_INTROSPECTION_ENDPOINT";
pub const UPSTREAM_URL_KEY: &str = "PEP_UPSTREAM_URL";
pub const BASE_URL_KEY: &str = "PEP_BASE_URL";
pub const INTROSPECTION_TIMEOUT_KEY: &str = "PEP_INTROSPECTION_TIMEOUT_SECONDS";
pub const UPSTREAM_TIMEOUT_KEY: &str = "PEP_UPSTREAM_TIMEOUT_SECONDS";
pub const REQUEST_TIMEOUT_KEY: &str = "PEP_REQUEST_TIMEOUT_SECONDS";
pub const MAX_BODY_BYTES_KEY: &str = "PEP_MAX_BODY_BYTES";

const DEFAULT_LISTEN_ADDRESS: &str = ":8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing environment variable: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid environment variable: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    /// `host:port`, resolved when binding.
    pub listen_address: String,
    pub app_env: AppEnv,

    pub introspection_endpoint: Url,
    pub upstream_url: Url,
    /// Public URL of this proxy; enables `resource_metadata` in challenges.
    pub base_url: Option<Url>,

    pub introspection_timeout: Duration,
    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let introspection_endpoint = get(TOKEN_INTROSPECTION_ENDPOINT_KEY)
            .ok_or(ConfigError::Missing(TOKEN_INTROSPECTION_ENDPOINT_KEY))?;
        let introspection_endpoint =
            parse_http_url(&introspection_endpoint, TOKEN_INTROSPECTION_ENDPOINT_KEY)?;

        let upstream_url = get(UPSTREAM_URL_KEY).ok_or(ConfigError::Missing(UPSTREAM_URL_KEY))?;
        let upstream_url = parse_http_url(&upstream_url, UPSTREAM_URL_KEY)?;

        let base_url = get(BASE_URL_KEY)
            .map(|v| parse_http_url(&v, BASE_URL_KEY))
            .transpose()?;

        let listen_address = parse_listen_address(
            &get(LISTEN_ADDRESS_KEY).unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string()),
        )?;

        let introspection_timeout =
            parse_seconds(get(INTROSPECTION_TIMEOUT_KEY), 10, INTROSPECTION_TIMEOUT_KEY)?;
        let upstream_timeout =
            parse_seconds(get(UPSTREAM_TIMEOUT_KEY), 30, UPSTREAM_TIMEOUT_KEY)?;
        let request_timeout = parse_seconds(get(REQUEST_TIMEOUT_KEY), 60, REQUEST_TIMEOUT_KEY)?;
        // introspection failures must surface as 401 before the global timeout fires
        if request_timeout <= introspection_timeout {
            return Err(ConfigError::Invalid(REQUEST_TIMEOUT_KEY));
        }

        let max_body_bytes = match get(MAX_BODY_BYTES_KEY) {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid(MAX_BODY_BYTES_KEY))?,
            None => 10 * 1024 * 1024, // 10 MiB
        };

        Ok(Self {
            listen_address,
            app_env: AppEnv::parse(lookup("APP_ENV").as_deref()),
            introspection_endpoint,
            upstream_url,
            base_url,
            introspection_timeout,
            upstream_timeout,
            request_timeout,
            max_body_bytes,
        })
    }

    pub fn http_limits(&self) -> HttpLimits {
        HttpLimits {
            max_body_bytes: self.max_body_bytes,
            request_timeout: self.request_timeout,
        }
    }
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|_| ConfigError::Invalid(key))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid(key));
    }
    Ok(url)
}

/// `:8080` listens on all interfaces, like `0.0.0.0:8080`.
fn parse_listen_address(value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    let (host, port) = value
        .rsplit_once(':')
        .ok_or(ConfigError::Invalid(LISTEN_ADDRESS_KEY))?;
    let port: u16 = port
        .parse()
        .map_err(|_| ConfigError::Invalid(LISTEN_ADDRESS_KEY))?;

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok(format!("{host}:{port}"))
}

fn parse_seconds(
    value: Option<String>,
    default: u64,
    key: &'static str,
) -> Result<Duration, ConfigError> {
    match value {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::Invalid(key)),
        None => Ok(Duration::from_secs(default)),
    }
}
