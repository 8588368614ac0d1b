//! # Core Configuration
//!
//! ## Overview
//!
//! Dependency wiring for the engine. Hosts hand the runtime a journal
//! vault and (optionally) an HTTP client through [`CoreConfigBuilder`];
//! everything downstream receives its capabilities from the resulting
//! [`CoreConfig`] rather than reaching for globals.
//!
//! Validation is fail-fast: `build()` refuses configurations that would
//! only blow up later inside a sync cycle.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfigBuilder;
//! use std::sync::Arc;
//!
//! let config = CoreConfigBuilder::new()
//!     .with_vault(Arc::new(my_vault))
//!     .with_event_buffer_size(256)
//!     .build()?;
//! ```
//!
//! With the `desktop-shims` feature enabled the builder falls back to a
//! reqwest-backed HTTP client when none is supplied; without it, the
//! HTTP capability must come from the host.

use crate::error::{Error, Result};
use bridge_traits::http::{HttpClient, RetryPolicy};
use core_journal::JournalVault;
use std::fmt;
use std::sync::Arc;

use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

// ============================================================================
// Configuration
// ============================================================================

/// Validated runtime configuration.
///
/// Construct through [`CoreConfigBuilder`]; a value of this type always
/// satisfies the build-time checks.
#[derive(Clone)]
pub struct CoreConfig {
    vault: Arc<dyn JournalVault>,
    http_client: Arc<dyn HttpClient>,
    retry_policy: RetryPolicy,
    event_buffer_size: usize,
}

impl CoreConfig {
    /// The journal vault holding local snapshot and settings state.
    pub fn vault(&self) -> Arc<dyn JournalVault> {
        Arc::clone(&self.vault)
    }

    /// The HTTP client used for remote backup traffic.
    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }

    /// Retry policy applied to remote requests.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy.clone()
    }

    /// Capacity of the event bus broadcast channel.
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("vault", &"Arc<dyn JournalVault>")
            .field("http_client", &"Arc<dyn HttpClient>")
            .field("retry_policy", &self.retry_policy)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`CoreConfig`].
pub struct CoreConfigBuilder {
    vault: Option<Arc<dyn JournalVault>>,
    http_client: Option<Arc<dyn HttpClient>>,
    retry_policy: RetryPolicy,
    event_buffer_size: usize,
}

impl CoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            vault: None,
            http_client: None,
            retry_policy: RetryPolicy::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }

    /// Sets the journal vault. Required.
    pub fn with_vault(mut self, vault: Arc<dyn JournalVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    /// Sets the HTTP client used for backup traffic.
    ///
    /// Optional when the `desktop-shims` feature is enabled; required
    /// otherwise.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Overrides the retry policy for remote requests.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Overrides the event bus channel capacity.
    pub fn with_event_buffer_size(mut self, capacity: usize) -> Self {
        self.event_buffer_size = capacity;
        self
    }

    /// Validates the configuration and produces a [`CoreConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the vault is missing, the retry
    /// policy allows zero attempts, or the event buffer capacity is
    /// zero. Returns [`Error::CapabilityMissing`] when no HTTP client
    /// was supplied and no platform default is available.
    pub fn build(self) -> Result<CoreConfig> {
        let vault = self
            .vault
            .ok_or_else(|| Error::Config("a journal vault is required".to_string()))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => default_http_client()?,
        };

        if self.retry_policy.max_attempts == 0 {
            return Err(Error::Config(
                "retry policy must allow at least one attempt".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event buffer size must be non-zero".to_string(),
            ));
        }

        Ok(CoreConfig {
            vault,
            http_client,
            retry_policy: self.retry_policy,
            event_buffer_size: self.event_buffer_size,
        })
    }
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CoreConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfigBuilder")
            .field("vault", &self.vault.as_ref().map(|_| "Arc<dyn JournalVault>"))
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "Arc<dyn HttpClient>"),
            )
            .field("retry_policy", &self.retry_policy)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

// ============================================================================
// Platform defaults
// ============================================================================

#[cfg(feature = "desktop-shims")]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    Ok(Arc::new(bridge_desktop::ReqwestHttpClient::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "http".to_string(),
        message: "no HTTP client configured; enable the desktop-shims feature or supply one \
                  with with_http_client"
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use core_journal::MemoryVault;

    struct NullHttpClient;

    #[async_trait]
    impl HttpClient for NullHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse> {
            Err(bridge_traits::error::BridgeError::NotAvailable(
                "null http client".to_string(),
            ))
        }
    }

    #[test]
    fn test_build_requires_vault() {
        let result = CoreConfigBuilder::new()
            .with_http_client(Arc::new(NullHttpClient))
            .build();

        assert!(matches!(result, Err(Error::Config(message)) if message.contains("vault")));
    }

    #[test]
    fn test_build_with_explicit_capabilities() {
        let config = CoreConfigBuilder::new()
            .with_vault(Arc::new(MemoryVault::new()))
            .with_http_client(Arc::new(NullHttpClient))
            .build()
            .unwrap();

        assert_eq!(config.event_buffer_size(), DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.retry_policy().max_attempts, 4);
    }

    #[test]
    fn test_build_rejects_zero_event_buffer() {
        let result = CoreConfigBuilder::new()
            .with_vault(Arc::new(MemoryVault::new()))
            .with_http_client(Arc::new(NullHttpClient))
            .with_event_buffer_size(0)
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_build_rejects_zero_attempt_retry_policy() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let result = CoreConfigBuilder::new()
            .with_vault(Arc::new(MemoryVault::new()))
            .with_http_client(Arc::new(NullHttpClient))
            .with_retry_policy(policy)
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_reports_capability() {
        let result = CoreConfigBuilder::new()
            .with_vault(Arc::new(MemoryVault::new()))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { capability, .. }) if capability == "http"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_missing_http_client_uses_desktop_default() {
        let result = CoreConfigBuilder::new()
            .with_vault(Arc::new(MemoryVault::new()))
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn test_debug_hides_capability_objects() {
        let config = CoreConfigBuilder::new()
            .with_vault(Arc::new(MemoryVault::new()))
            .with_http_client(Arc::new(NullHttpClient))
            .build()
            .unwrap();

        let rendered = format!("{config:?}");
        assert!(rendered.contains("Arc<dyn JournalVault>"));
        assert!(rendered.contains("Arc<dyn HttpClient>"));
        assert!(!rendered.contains("NullHttpClient"));
    }
}
