//! HTTP transport seam and structured transport errors.
//!
//! The `Transport` trait abstracts the single GET the fetch layer needs so the
//! retry, paging, and parsing logic can be driven by a scripted mock in tests.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the optional API key.
pub const API_KEY_HEADER: &str = "X-BAPI-API-KEY";

/// Environment variable read for the optional API key.
pub const DEFAULT_API_KEY_ENV: &str = "BYBIT_API_KEY";

/// Generic user agent sent on every request.
pub const USER_AGENT: &str = concat!("perpscan/", env!("CARGO_PKG_VERSION"));

/// Upstream API code for "too many visits".
const RET_CODE_RATE_LIMITED: i64 = 10006;

/// Structured transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rate limited by upstream (HTTP 429)")]
    RateLimited,

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("transport configuration error: {0}")]
    Config(String),
}

impl TransportError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, TransportError::RateLimited)
    }
}

/// A blocking JSON GET.
///
/// Implementations must be shareable across the scan worker pool.
pub trait Transport: Send + Sync {
    /// Issue a GET and return the decoded JSON body.
    ///
    /// A 429 status (or the equivalent API code) must map to
    /// [`TransportError::RateLimited`] so the fetcher can apply jittered backoff.
    fn get_json(&self, url: &str) -> Result<Value, TransportError>;
}

/// Reqwest-backed transport sharing one connection pool.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a transport, optionally authenticated with an API key header.
    pub fn new(api_key: Option<&str>, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            let value = reqwest::header::HeaderValue::from_str(key.trim())
                .map_err(|e| TransportError::Config(format!("invalid API key header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Build a transport reading the API key from `env_var`. An unset or empty
    /// variable yields an unauthenticated transport.
    pub fn from_env(env_var: &str, timeout: Duration) -> Result<Self, TransportError> {
        let key = std::env::var(env_var).ok();
        if key.is_none() {
            tracing::debug!(env_var, "no API key set, using unauthenticated requests");
        }
        Self::new(key.as_deref(), timeout)
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = resp
            .json()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        check_ret_code(&body)?;
        Ok(body)
    }
}

/// Map a non-zero `retCode` in the response envelope to an error.
pub fn check_ret_code(body: &Value) -> Result<(), TransportError> {
    let code = match body.get("retCode").and_then(Value::as_i64) {
        Some(code) => code,
        None => return Ok(()),
    };
    match code {
        0 => Ok(()),
        RET_CODE_RATE_LIMITED => Err(TransportError::RateLimited),
        _ => Err(TransportError::Api {
            code,
            message: body
                .get("retMsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
    }
}
