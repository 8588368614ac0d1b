//! File-backed Journal Vault
//!
//! Persists the snapshot and settings documents as JSON files under an
//! application data directory.

use async_trait::async_trait;
use core_journal::{JournalError, JournalVault, Result, Snapshot, SyncSettings};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// Snapshot document name under the data directory
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Settings document name under the data directory
const SETTINGS_FILE: &str = "settings.json";

/// File-backed [`JournalVault`] implementation
///
/// Stores two JSON documents, `snapshot.json` and `settings.json`, under a
/// data directory. Writes go through a temp file and an atomic rename, so a
/// crash never leaves a torn document behind.
///
/// The revision counter is process-local: the vault assumes it is the only
/// writer of its directory while open. Missing documents read back as empty
/// defaults, which is how a first launch looks.
pub struct FileVault {
    data_dir: PathBuf,

    /// Current revision; also serializes all document access
    revision: Mutex<u64>,
}

impl FileVault {
    /// Open a vault under the platform data directory
    pub fn new() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("daybook");

        Self::with_data_dir(data_dir)
    }

    /// Open a vault under a custom directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            revision: Mutex::new(0),
        }
    }

    /// Directory the vault documents live under
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    fn map_io_error(e: std::io::Error) -> JournalError {
        JournalError::Storage(e.to_string())
    }

    /// Read a JSON document, `None` when the file does not exist yet
    async fn read_document<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.data_dir.join(name);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::map_io_error(e)),
        };

        let document = serde_json::from_slice(&raw)?;
        debug!(path = ?path, bytes = raw.len(), "Read document");
        Ok(Some(document))
    }

    /// Write a JSON document through a temp file and rename
    async fn write_document<T: Serialize>(&self, name: &str, document: &T) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(Self::map_io_error)?;

        let json = serde_json::to_vec_pretty(document)?;
        let path = self.data_dir.join(name);
        let staged = self.data_dir.join(format!("{name}.tmp"));

        fs::write(&staged, &json).await.map_err(Self::map_io_error)?;
        // Rename is atomic within one filesystem.
        fs::rename(&staged, &path)
            .await
            .map_err(Self::map_io_error)?;

        debug!(path = ?path, bytes = json.len(), "Wrote document");
        Ok(())
    }
}

impl Default for FileVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JournalVault for FileVault {
    async fn read_all(&self) -> Result<Snapshot> {
        let revision = self.revision.lock().await;
        let mut snapshot = self
            .read_document::<Snapshot>(SNAPSHOT_FILE)
            .await?
            .unwrap_or_default();
        snapshot.revision = *revision;
        Ok(snapshot)
    }

    async fn write_all(&self, snapshot: &Snapshot) -> Result<()> {
        let mut revision = self.revision.lock().await;
        if snapshot.revision != *revision {
            return Err(JournalError::RevisionConflict {
                current: *revision,
                based_on: snapshot.revision,
            });
        }

        self.write_document(SNAPSHOT_FILE, snapshot).await?;
        *revision += 1;
        Ok(())
    }

    async fn read_settings(&self) -> Result<SyncSettings> {
        let _guard = self.revision.lock().await;
        Ok(self
            .read_document::<SyncSettings>(SETTINGS_FILE)
            .await?
            .unwrap_or_default())
    }

    async fn write_settings(&self, settings: &SyncSettings) -> Result<()> {
        let _guard = self.revision.lock().await;
        self.write_document(SETTINGS_FILE, settings).await
    }
}
