//! # Journal Vault Contract
//!
//! The persistence seam between the sync engine and the host application's
//! storage. The engine reads and writes whole documents only: the complete
//! snapshot and the complete sync settings. Hosts implement this trait over
//! whatever store they already own.
//!
//! ## Revision checking
//!
//! Whole-snapshot write-back can race the user editing a record mid-cycle.
//! To keep those edits, `read_all` stamps the snapshot with the vault's
//! current revision and `write_all` rejects a write whose base revision is no
//! longer current with [`JournalError::RevisionConflict`]. Callers re-read
//! and rebuild their write on conflict.

use crate::error::{JournalError, Result};
use crate::settings::SyncSettings;
use crate::snapshot::Snapshot;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Whole-document persistence contract for journal data
#[async_trait]
pub trait JournalVault: Send + Sync {
    /// Read the complete local state as a fresh snapshot, stamped with the
    /// vault's current revision.
    async fn read_all(&self) -> Result<Snapshot>;

    /// Persist `snapshot` as the complete local state.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::RevisionConflict`] when the vault has advanced
    /// past `snapshot.revision` since the corresponding `read_all`.
    async fn write_all(&self, snapshot: &Snapshot) -> Result<()>;

    /// Read the sync settings document.
    async fn read_settings(&self) -> Result<SyncSettings>;

    /// Persist the sync settings document.
    async fn write_settings(&self, settings: &SyncSettings) -> Result<()>;
}

// =============================================================================
// In-memory implementation
// =============================================================================

#[derive(Default)]
struct MemoryVaultState {
    snapshot: Snapshot,
    revision: u64,
    settings: SyncSettings,
}

/// In-memory [`JournalVault`] for tests, demos, and previews
#[derive(Default)]
pub struct MemoryVault {
    state: Mutex<MemoryVaultState>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct with an initial settings document
    pub fn with_settings(settings: SyncSettings) -> Self {
        Self {
            state: Mutex::new(MemoryVaultState {
                settings,
                ..Default::default()
            }),
        }
    }

    /// Replace the stored snapshot outside the revision protocol, advancing
    /// the revision. This is how a concurrent local edit looks to the engine.
    pub async fn seed_snapshot(&self, snapshot: Snapshot) {
        let mut state = self.state.lock().await;
        state.snapshot = snapshot;
        state.revision += 1;
    }

    /// Current vault revision
    pub async fn revision(&self) -> u64 {
        self.state.lock().await.revision
    }
}

#[async_trait]
impl JournalVault for MemoryVault {
    async fn read_all(&self) -> Result<Snapshot> {
        let state = self.state.lock().await;
        let mut snapshot = state.snapshot.clone();
        snapshot.revision = state.revision;
        Ok(snapshot)
    }

    async fn write_all(&self, snapshot: &Snapshot) -> Result<()> {
        let mut state = self.state.lock().await;
        if snapshot.revision != state.revision {
            return Err(JournalError::RevisionConflict {
                current: state.revision,
                based_on: snapshot.revision,
            });
        }
        state.snapshot = snapshot.clone();
        state.revision += 1;
        Ok(())
    }

    async fn read_settings(&self) -> Result<SyncSettings> {
        Ok(self.state.lock().await.settings.clone())
    }

    async fn write_settings(&self, settings: &SyncSettings) -> Result<()> {
        self.state.lock().await.settings = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, RecordKind};
    use chrono::{TimeZone, Utc};

    fn snapshot_with_task(id: &str) -> Snapshot {
        let created = Utc.timestamp_opt(1_000, 0).unwrap();
        Snapshot::default().with_records(RecordKind::Tasks, vec![Record::new(id, created)])
    }

    #[tokio::test]
    async fn test_read_write_round_trip() {
        let vault = MemoryVault::new();

        let mut snapshot = vault.read_all().await.unwrap();
        assert_eq!(snapshot.revision, 0);

        snapshot.tasks = snapshot_with_task("t1").tasks;
        vault.write_all(&snapshot).await.unwrap();

        let reread = vault.read_all().await.unwrap();
        assert_eq!(reread.revision, 1);
        assert_eq!(reread.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected() {
        let vault = MemoryVault::new();
        let stale = vault.read_all().await.unwrap();

        // A local edit lands between read and write-back.
        vault.seed_snapshot(snapshot_with_task("edited")).await;

        let result = vault.write_all(&stale).await;
        assert!(matches!(
            result,
            Err(JournalError::RevisionConflict {
                current: 1,
                based_on: 0
            })
        ));

        // Rebasing on a fresh read succeeds.
        let fresh = vault.read_all().await.unwrap();
        vault.write_all(&fresh).await.unwrap();
        assert_eq!(vault.revision().await, 2);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let vault = MemoryVault::new();
        let mut settings = vault.read_settings().await.unwrap();
        assert!(!settings.enabled);

        settings.enabled = true;
        settings.endpoint = "https://dav.example.com/daybook/".to_string();
        vault.write_settings(&settings).await.unwrap();

        let reread = vault.read_settings().await.unwrap();
        assert!(reread.enabled);
        assert_eq!(reread.endpoint, "https://dav.example.com/daybook/");
    }
}
