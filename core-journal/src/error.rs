//! Error types for the journal model and vault contract.

use thiserror::Error;

/// Result type alias for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;

/// Errors surfaced by the journal model and vault implementations
#[derive(Debug, Error)]
pub enum JournalError {
    /// A record kind name was not one of the tracked data types
    #[error("Unknown record kind: {value}")]
    UnknownKind { value: String },

    /// Snapshot or settings document could not be encoded/decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying storage failure reported by the vault implementation
    #[error("Vault storage error: {0}")]
    Storage(String),

    /// The snapshot being written was read at a revision that is no longer
    /// current; the caller must re-read and retry the write
    #[error("Snapshot revision conflict: vault is at {current}, write was based on {based_on}")]
    RevisionConflict { current: u64, based_on: u64 },
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        JournalError::Serialization(err.to_string())
    }
}
