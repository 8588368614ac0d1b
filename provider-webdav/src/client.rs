//! WebDAV remote store implementation
//!
//! Implements the `RemoteStore` trait against any RFC 4918 server.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use core_journal::{Credentials, Snapshot, SyncSettings};
use core_sync::RemoteStore;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, WebDavError};
use crate::multistatus::{parse_multistatus, ResourceEntry};

/// Name prefix shared by every backup object
const BACKUP_PREFIX: &str = "daybook-backup-";

/// Suffix of every backup object
const BACKUP_SUFFIX: &str = ".json";

/// Timestamp layout embedded in backup object names
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Per-request timeout handed to the transport
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on response body text quoted in errors and logs
const ERROR_EXCERPT_LIMIT: usize = 200;

/// PROPFIND body asking for exactly the properties the listing needs
const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:displayname/>
    <d:getlastmodified/>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#;

// =============================================================================
// Configuration
// =============================================================================

/// Connection parameters for a WebDAV backup collection
///
/// The endpoint is normalized to a trailing-slash collection URL at
/// construction, so object URLs can be appended directly.
#[derive(Debug, Clone)]
pub struct WebDavConfig {
    endpoint: String,
    credentials: Credentials,
}

impl WebDavConfig {
    /// Create a config for the given collection URL
    ///
    /// # Errors
    ///
    /// Returns [`WebDavError::InvalidConfig`] when the endpoint is not an
    /// http(s) URL.
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let mut endpoint = endpoint.into().trim().to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(WebDavError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got {endpoint:?}"
            )));
        }
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Ok(Self {
            endpoint,
            credentials,
        })
    }

    /// Build a config from persisted sync settings
    pub fn from_settings(settings: &SyncSettings) -> Result<Self> {
        Self::new(settings.endpoint.clone(), settings.credentials.clone())
    }

    /// Collection URL the backup objects live under, trailing slash included
    pub fn collection_url(&self) -> &str {
        &self.endpoint
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}{}", self.endpoint, urlencoding::encode(name))
    }
}

// =============================================================================
// Backup object naming
// =============================================================================

/// Name for a backup object created at `at`
fn backup_object_name(at: DateTime<Utc>) -> String {
    format!(
        "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
        at.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

fn is_backup_name(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX)
}

/// Timestamp embedded in a backup object name
fn timestamp_from_name(name: &str) -> Option<DateTime<Utc>> {
    let stem = name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_SUFFIX)?;
    NaiveDateTime::parse_from_str(stem, BACKUP_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Trimmed response body capped for error messages
fn body_excerpt(response: &HttpResponse) -> String {
    String::from_utf8_lossy(&response.body)
        .trim()
        .chars()
        .take(ERROR_EXCERPT_LIMIT)
        .collect()
}

// =============================================================================
// WebDAV store
// =============================================================================

/// WebDAV remote store client
///
/// Implements [`RemoteStore`] against any RFC 4918 server (Nextcloud,
/// ownCloud, Apache mod_dav, rclone serve webdav).
///
/// # Features
///
/// - Timestamped, append-only backup objects (`daybook-backup-<stamp>.json`)
/// - Depth-1 PROPFIND listing with client-side prefix filtering
/// - Uniform retry with exponential backoff on 5xx and connection failures
/// - HTTP Basic authentication via `HttpClient`
///
/// # Example
///
/// ```ignore
/// use provider_webdav::{WebDavConfig, WebDavStore};
/// use core_sync::RemoteStore;
///
/// let config = WebDavConfig::from_settings(&settings)?;
/// let store = WebDavStore::new(http_client, config);
/// let latest = store.download_latest_snapshot().await?;
/// ```
pub struct WebDavStore {
    /// HTTP client for server requests
    http_client: Arc<dyn HttpClient>,

    /// Retry policy applied uniformly to every request
    retry_policy: RetryPolicy,

    config: WebDavConfig,
}

impl fmt::Debug for WebDavStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavStore")
            .field("http_client", &"Arc<dyn HttpClient>")
            .field("retry_policy", &self.retry_policy)
            .field("config", &self.config)
            .finish()
    }
}

impl WebDavStore {
    /// Create a new store with the default retry policy
    pub fn new(http_client: Arc<dyn HttpClient>, config: WebDavConfig) -> Self {
        Self {
            http_client,
            retry_policy: RetryPolicy::default(),
            config,
        }
    }

    /// Replace the default retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Authenticated request skeleton
    fn request(&self, method: HttpMethod, url: impl Into<String>) -> HttpRequest {
        HttpRequest::new(method, url)
            .basic_auth(
                &self.config.credentials.username,
                self.config.credentials.password(),
            )
            .timeout(REQUEST_TIMEOUT)
    }

    /// Execute a request under the uniform retry policy
    ///
    /// Success statuses return immediately. Connection failures and 5xx
    /// statuses are retried with exponential backoff until the policy is
    /// exhausted, then surface the last error. 4xx statuses are terminal
    /// and never retried.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), url = %request.url))]
    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 1u32;

        loop {
            let failure = match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, "request succeeded");
                    return Ok(response);
                }
                Ok(response) if response.is_server_error() => WebDavError::Server {
                    status: response.status,
                    message: body_excerpt(&response),
                },
                Ok(response) => {
                    warn!(status = response.status, "request rejected");
                    return Err(WebDavError::Server {
                        status: response.status,
                        message: body_excerpt(&response),
                    });
                }
                Err(e) => WebDavError::Network(e.to_string()),
            };

            match self.retry_policy.backoff_delay(attempt) {
                Some(delay) => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "request failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    warn!(attempt, error = %failure, "request failed, retries exhausted");
                    return Err(failure);
                }
            }
        }
    }

    /// Depth-1 listing of the collection, filtered to backup objects
    async fn list_backups(&self) -> Result<Vec<ResourceEntry>> {
        let request = self
            .request(HttpMethod::Propfind, self.config.collection_url())
            .depth(1)
            .header("Content-Type", "application/xml")
            .body(Bytes::from_static(PROPFIND_BODY.as_bytes()));
        let response = self.execute_with_retry(request).await?;

        let document = String::from_utf8_lossy(&response.body);
        let entries = parse_multistatus(&document)?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_collection && is_backup_name(entry.name()))
            .collect())
    }

    /// MKCOL the backup collection
    async fn create_collection(&self) -> Result<()> {
        let request = self.request(HttpMethod::Mkcol, self.config.collection_url());
        match self.execute_with_retry(request).await {
            Ok(_) => Ok(()),
            // 405 means the collection already exists.
            Err(WebDavError::Server { status: 405, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RemoteStore for WebDavStore {
    #[instrument(skip(self))]
    async fn test_connection(&self) -> core_sync::Result<bool> {
        let request = self
            .request(HttpMethod::Propfind, self.config.collection_url())
            .depth(0)
            .header("Content-Type", "application/xml")
            .body(Bytes::from_static(PROPFIND_BODY.as_bytes()));

        match self.execute_with_retry(request).await {
            Ok(_) => Ok(true),
            // Reachable and authorized; the collection appears on first upload.
            Err(WebDavError::Server { status: 404, .. }) => Ok(true),
            Err(WebDavError::Server { status, .. }) => {
                info!(status, "connection probe rejected");
                Ok(false)
            }
            Err(WebDavError::Network(message)) => {
                info!(%message, "connection probe failed");
                Ok(false)
            }
            Err(other) => Err(other.into()),
        }
    }

    #[instrument(skip(self, snapshot))]
    async fn upload_snapshot(&self, snapshot: &Snapshot) -> core_sync::Result<()> {
        let name = backup_object_name(Utc::now());
        let body = serde_json::to_vec(snapshot)
            .map_err(|e| WebDavError::Document(format!("failed to serialize snapshot: {e}")))?;
        info!(object = %name, bytes = body.len(), "uploading snapshot backup");

        let put = self
            .request(HttpMethod::Put, self.config.object_url(&name))
            .header("Content-Type", "application/json")
            .body(Bytes::from(body));

        match self.execute_with_retry(put.clone()).await {
            Ok(_) => {}
            // The collection may not exist before the very first upload.
            Err(WebDavError::Server {
                status: 404 | 409, ..
            }) => {
                info!("backup collection missing, creating it");
                self.create_collection().await?;
                self.execute_with_retry(put).await?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(object = %name, "snapshot backup uploaded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn download_latest_snapshot(
        &self,
    ) -> core_sync::Result<Option<(Snapshot, DateTime<Utc>)>> {
        let backups = match self.list_backups().await {
            Ok(backups) => backups,
            Err(WebDavError::Server { status: 404, .. }) => {
                debug!("backup collection does not exist yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(latest) = backups.into_iter().max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.name().cmp(b.name()))
        }) else {
            debug!("no backup objects in the collection");
            return Ok(None);
        };

        let name = latest.file_name().to_string();
        info!(object = %name, "downloading latest snapshot backup");

        let request = self.request(HttpMethod::Get, self.config.object_url(&name));
        let response = self.execute_with_retry(request).await?;
        let snapshot: Snapshot = serde_json::from_slice(&response.body).map_err(|e| {
            WebDavError::Document(format!("failed to deserialize backup {name}: {e}"))
        })?;

        // A backup with no usable timestamp counts as arbitrarily old
        // rather than freshly modified.
        let modified = latest
            .last_modified
            .or_else(|| timestamp_from_name(&name))
            .unwrap_or(DateTime::UNIX_EPOCH);

        info!(
            object = %name,
            records = snapshot.record_count(),
            "snapshot backup downloaded"
        );
        Ok(Some((snapshot, modified)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use chrono::TimeZone;
    use mockall::{mock, Sequence};
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(
                &self,
                request: HttpRequest,
            ) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    const LISTING_WITH_TWO_BACKUPS: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/daybook/</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>daybook</d:displayname>
        <d:resourcetype><d:collection/></d:resourcetype>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/daybook/daybook-backup-20260101T000000Z.json</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>daybook-backup-20260101T000000Z.json</d:displayname>
        <d:getlastmodified>Thu, 01 Jan 2026 00:00:00 GMT</d:getlastmodified>
        <d:resourcetype/>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/daybook/daybook-backup-20260605T102134Z.json</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>daybook-backup-20260605T102134Z.json</d:displayname>
        <d:getlastmodified>Fri, 05 Jun 2026 10:21:34 GMT</d:getlastmodified>
        <d:resourcetype/>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    const LISTING_WITHOUT_BACKUPS: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/daybook/</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>daybook</d:displayname>
        <d:resourcetype><d:collection/></d:resourcetype>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    fn status_response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    fn body_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
            use_exponential_backoff: true,
        }
    }

    fn test_store(mock: MockHttpClient) -> WebDavStore {
        let config = WebDavConfig::new(
            "https://dav.example.com/daybook",
            Credentials::new("ada", "s3cret"),
        )
        .unwrap();
        WebDavStore::new(Arc::new(mock), config).with_retry_policy(fast_policy())
    }

    #[test]
    fn test_config_normalizes_endpoint() {
        let config = WebDavConfig::new(
            "https://dav.example.com/daybook",
            Credentials::default(),
        )
        .unwrap();

        assert_eq!(config.collection_url(), "https://dav.example.com/daybook/");
        assert_eq!(
            config.object_url("a b.json"),
            "https://dav.example.com/daybook/a%20b.json"
        );
    }

    #[test]
    fn test_config_rejects_non_http_endpoint() {
        let result = WebDavConfig::new("ftp://dav.example.com/", Credentials::default());
        assert!(matches!(result, Err(WebDavError::InvalidConfig(_))));
    }

    #[test]
    fn test_backup_name_round_trip() {
        let at = Utc.with_ymd_and_hms(2026, 8, 23, 7, 5, 9).unwrap();
        let name = backup_object_name(at);

        assert_eq!(name, "daybook-backup-20260823T070509Z.json");
        assert!(is_backup_name(&name));
        assert_eq!(timestamp_from_name(&name), Some(at));
    }

    #[tokio::test]
    async fn test_upload_writes_timestamped_object() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|request| {
            assert_eq!(request.method, HttpMethod::Put);
            assert!(request
                .url
                .starts_with("https://dav.example.com/daybook/daybook-backup-"));
            assert!(request.url.ends_with(".json"));

            let auth = request.headers.get("Authorization").unwrap();
            assert!(auth.starts_with("Basic "));

            let body = request.body.expect("PUT carries a body");
            let _: Snapshot = serde_json::from_slice(&body).unwrap();

            Ok(status_response(201))
        });

        let store = test_store(mock);
        store.upload_snapshot(&Snapshot::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_creates_missing_collection() {
        let mut seq = Sequence::new();
        let mut mock = MockHttpClient::new();

        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Put);
                Ok(status_response(409))
            });
        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Mkcol);
                Ok(status_response(201))
            });
        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Put);
                Ok(status_response(201))
            });

        let store = test_store(mock);
        store.upload_snapshot(&Snapshot::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_download_picks_newest_backup() {
        let mut seq = Sequence::new();
        let mut mock = MockHttpClient::new();

        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Propfind);
                assert_eq!(request.headers.get("Depth"), Some(&"1".to_string()));
                Ok(body_response(207, LISTING_WITH_TWO_BACKUPS))
            });
        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Get);
                assert!(request
                    .url
                    .ends_with("daybook-backup-20260605T102134Z.json"));
                let body = serde_json::to_string(&Snapshot::default()).unwrap();
                Ok(body_response(200, &body))
            });

        let store = test_store(mock);
        let (snapshot, modified) = store
            .download_latest_snapshot()
            .await
            .unwrap()
            .expect("a backup exists");

        assert_eq!(snapshot.record_count(), 0);
        assert_eq!(
            modified,
            Utc.with_ymd_and_hms(2026, 6, 5, 10, 21, 34).unwrap()
        );
    }

    #[tokio::test]
    async fn test_download_without_backups_returns_none() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(body_response(207, LISTING_WITHOUT_BACKUPS)));

        let store = test_store(mock);
        let result = store.download_latest_snapshot().await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_download_with_missing_collection_returns_none() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(status_response(404)));

        let store = test_store(mock);
        let result = store.download_latest_snapshot().await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_server_errors_retry_until_exhausted() {
        let mut mock = MockHttpClient::new();
        // One initial attempt plus three retries.
        mock.expect_execute()
            .times(4)
            .returning(|_| Ok(body_response(503, "maintenance")));

        let store = test_store(mock);
        let error = store
            .upload_snapshot(&Snapshot::default())
            .await
            .unwrap_err();

        match error {
            core_sync::SyncError::Transport(message) => {
                assert!(message.contains("503"));
                assert!(message.contains("maintenance"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_errors_are_terminal() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(status_response(403)));

        let store = test_store(mock);
        let error = store
            .upload_snapshot(&Snapshot::default())
            .await
            .unwrap_err();

        assert!(matches!(error, core_sync::SyncError::Transport(_)));
        assert!(error.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_connection_failures_retry_until_exhausted() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(4)
            .returning(|_| Err(BridgeError::Connection("connection refused".to_string())));

        let store = test_store(mock);
        let error = store
            .upload_snapshot(&Snapshot::default())
            .await
            .unwrap_err();

        assert!(error.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_retry_recovers_on_final_attempt() {
        let mut seq = Sequence::new();
        let mut mock = MockHttpClient::new();

        // Three 500s burn attempts 1-3; the fourth and last attempt lands.
        mock.expect_execute()
            .times(3)
            .in_sequence(&mut seq)
            .returning(|_| Ok(status_response(500)));
        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(status_response(201)));

        let store = test_store(mock);
        store.upload_snapshot(&Snapshot::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_probe_succeeds() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|request| {
            assert_eq!(request.method, HttpMethod::Propfind);
            assert_eq!(request.headers.get("Depth"), Some(&"0".to_string()));
            Ok(body_response(207, LISTING_WITHOUT_BACKUPS))
        });

        let store = test_store(mock);
        assert!(store.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_probe_rejects_bad_credentials() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(status_response(401)));

        let store = test_store(mock);
        assert!(!store.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_probe_tolerates_missing_collection() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(status_response(404)));

        let store = test_store(mock);
        assert!(store.test_connection().await.unwrap());
    }
}
