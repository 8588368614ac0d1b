//! # Sync Error Types

use core_journal::JournalError;
use thiserror::Error;

/// Errors produced by the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or HTTP failure that survived the retry policy.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Sync was attempted while disabled in settings.
    #[error("Sync is not enabled")]
    NotEnabled,

    /// A download found no backup object on the remote store.
    #[error("No backup found on the remote store")]
    NoBackupFound,

    /// Another sync cycle currently holds the in-progress gate.
    #[error("A sync is already in progress")]
    SyncInProgress,

    /// Merging a conflict, or persisting/re-uploading the merge, failed.
    #[error("Conflict resolution failed: {0}")]
    ConflictResolution(String),

    /// The local vault rejected a read or write.
    #[error(transparent)]
    Vault(#[from] JournalError),

    /// Unexpected internal failure.
    #[error("Internal sync error: {0}")]
    Internal(String),
}

/// Convenience result alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
