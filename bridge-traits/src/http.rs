//! HTTP Client Abstraction
//!
//! Provides async HTTP operations, including the DAV verbs the remote store
//! client relies on, behind a platform-agnostic trait.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types, including the WebDAV extension verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Propfind,
    Mkcol,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Propfind => "PROPFIND",
            HttpMethod::Mkcol => "MKCOL",
        }
    }
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach an HTTP Basic `Authorization` header
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let credential = BASE64.encode(format!("{username}:{password}"));
        self.header("Authorization", format!("Basic {credential}"))
    }

    /// Attach a `Depth` header (DAV metadata queries)
    pub fn depth(self, depth: u8) -> Self {
        self.header("Depth", depth.to_string())
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON serialization failed: {}", e))
        })?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Retry policy configuration
///
/// `max_attempts` counts the initial attempt, so the default allows three
/// retries after the first failure with backoff delays of 1 s, 2 s, 4 s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Ceiling on any single backoff delay
    pub max_delay: Duration,
    /// Whether to double the delay after each failed attempt
    pub use_exponential_backoff: bool,
}

impl RetryPolicy {
    /// Backoff delay after the given 1-based failed attempt, `None` once
    /// attempts are exhausted.
    pub fn backoff_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let delay = if self.use_exponential_backoff {
            self.base_delay
                .checked_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
                .unwrap_or(self.max_delay)
        } else {
            self.base_delay
        };
        Some(delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            use_exponential_backoff: true,
        }
    }
}

/// Async HTTP client trait
///
/// A single-attempt transport. Retry and backoff are layered on top by the
/// remote store client so the policy is applied uniformly to every call
/// rather than per implementation.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn probe(client: &dyn HttpClient) -> Result<u16> {
///     let request = HttpRequest::new(HttpMethod::Propfind, "https://dav.example.com/")
///         .basic_auth("user", "pass")
///         .depth(0);
///     Ok(client.execute(request).await?.status)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request once
    ///
    /// # Errors
    ///
    /// Returns an error only for transport-level failures (connection,
    /// TLS, timeout). Non-2xx statuses are returned as responses.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Propfind, "https://example.com/dav/")
            .header("User-Agent", "test")
            .basic_auth("ada", "s3cret")
            .depth(1)
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com/dav/");
        assert_eq!(request.headers.get("Depth"), Some(&"1".to_string()));
        let auth = request.headers.get("Authorization").unwrap();
        assert!(auth.starts_with("Basic "));
        // "ada:s3cret" base64-encoded
        assert_eq!(auth, "Basic YWRhOnMzY3JldA==");
    }

    #[test]
    fn test_method_names_cover_dav_verbs() {
        assert_eq!(HttpMethod::Propfind.as_str(), "PROPFIND");
        assert_eq!(HttpMethod::Mkcol.as_str(), "MKCOL");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
    }

    #[test]
    fn test_http_response_status_checks() {
        let response = HttpResponse {
            status: 207,
            headers: HashMap::new(),
            body: Bytes::from("test"),
        };

        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn test_backoff_schedule_is_exponential_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.backoff_delay(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.backoff_delay(3), Some(Duration::from_secs(4)));
        // Attempts exhausted after the fourth.
        assert_eq!(policy.backoff_delay(4), None);

        let capped = RetryPolicy {
            max_attempts: 10,
            ..RetryPolicy::default()
        };
        assert_eq!(capped.backoff_delay(9), Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_constant_backoff() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            use_exponential_backoff: false,
        };
        assert_eq!(policy.backoff_delay(1), Some(Duration::from_millis(50)));
        assert_eq!(policy.backoff_delay(2), Some(Duration::from_millis(50)));
        assert_eq!(policy.backoff_delay(3), None);
    }
}
