//! HTTP transport seam
//!
//! Every remote call goes through `HttpTransport::send`, one request and one
//! fully-read response per call. The connection is released before `send`
//! returns, on success, error and throttling alike. The production
//! implementation wraps `reqwest`; tests script responses in memory.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use common::Secret;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// HTTP methods used by the gallery API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A single API request. `path` is relative to the transport's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Full `Authorization` header value, e.g. `Bearer <token>`
    pub authorization: Option<Secret<String>>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            authorization: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Append a query parameter, replacing an existing one with the same key.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_query(key, value);
        self
    }

    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
    }

    pub fn with_authorization(mut self, header: Secret<String>) -> Self {
        self.authorization = Some(header);
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status plus decoded JSON body. An empty body decodes to `Value::Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// The `{error, error_description}` pair the API puts in failed payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub error: String,
    pub description: String,
}

impl UpstreamError {
    /// The description, or the bare error code when the API sent none.
    pub fn message(self) -> String {
        if self.description.is_empty() {
            self.error
        } else {
            self.description
        }
    }
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Extract the payload-level error, if the body carries an `error` field.
    pub fn upstream_error(&self) -> Option<UpstreamError> {
        let error = self.body.get("error").filter(|v| !v.is_null())?;
        let error = match error.as_str() {
            Some(s) => s.to_string(),
            None => error.to_string(),
        };
        let description = self
            .body
            .get("error_description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(UpstreamError { error, description })
    }
}

/// Request/response exchange with the gallery host.
///
/// Uses `Pin<Box<dyn Future>>` so it can be held as `Arc<dyn HttpTransport>`.
pub trait HttpTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>>;
}

/// `reqwest`-backed transport against a fixed base URL.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build a transport with its own client and a per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("building HTTP client: {e}")))?;
        Ok(Self::new(client, base_url))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.url_for(&request.path);
            let mut builder = match request.method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
            }
            .query(&request.query);
            if let Some(header) = &request.authorization {
                builder = builder.header(reqwest::header::AUTHORIZATION, header.expose().as_str());
            }

            let response = builder.send().await.map_err(|e| {
                Error::Transport(format!("{} {} failed: {e}", request.method, request.path))
            })?;
            let status = response.status().as_u16();
            let bytes = response.bytes().await.map_err(|e| {
                Error::Transport(format!("reading body of {}: {e}", request.path))
            })?;
            debug!(method = %request.method, path = %request.path, status, "api exchange");

            let body = decode_body(status, &bytes).ok_or_else(|| {
                Error::Transport(format!(
                    "{} returned {status} with a non-JSON body: {}",
                    request.path,
                    body_excerpt(&bytes)
                ))
            })?;
            Ok(ApiResponse { status, body })
        })
    }
}

/// Longest slice of a non-JSON body quoted in an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// Lossy text of the first `BODY_EXCERPT_LEN` bytes of `bytes`.
fn body_excerpt(bytes: &[u8]) -> String {
    let end = bytes.len().min(BODY_EXCERPT_LEN);
    let mut excerpt = String::from_utf8_lossy(&bytes[..end]).into_owned();
    if bytes.len() > end {
        excerpt.push_str("...");
    }
    excerpt
}

/// Decode a response body. A throttled response may carry anything, so an
/// undecodable 429 body becomes `Null` instead of an error.
fn decode_body(status: u16, bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) if status == 429 => Some(Value::Null),
        Err(_) => None,
    }
}
