//! # Remote Store Contract
//!
//! Transport abstraction the orchestrator syncs against. Implementations
//! live in provider crates (e.g. `provider-webdav`) and are expected to
//! apply the retry policy internally, so every method here either
//! succeeds or has already exhausted its retries.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_journal::Snapshot;

/// Authenticated access to the remote backup store.
///
/// The store is append-only from the engine's point of view: each
/// upload creates a new timestamped backup object, and downloads always
/// pick the newest one.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Probes the store for reachability and accepted credentials.
    ///
    /// Never fails for a reachable-but-unauthorized server; that case
    /// returns `Ok(false)`. Errors are reserved for situations where no
    /// probe could be made at all.
    async fn test_connection(&self) -> Result<bool>;

    /// Writes the snapshot to a new uniquely named backup object.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`](crate::SyncError::Transport)
    /// when the write does not succeed after retries.
    async fn upload_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// Fetches the most recent backup object, if any.
    ///
    /// Returns the deserialized snapshot together with its remote
    /// modification time, or `None` when the store holds no backups
    /// (not an error).
    async fn download_latest_snapshot(&self) -> Result<Option<(Snapshot, DateTime<Utc>)>>;
}
