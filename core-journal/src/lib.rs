//! # Daybook Journal Model
//!
//! Data model for the Daybook journal: the typed record lists the sync engine
//! moves between the local device and the remote store, the sync settings
//! document, and the [`JournalVault`] contract against the host application's
//! persistence layer.
//!
//! The sync engine never touches storage more granularly than the four vault
//! operations (`read_all`, `write_all`, `read_settings`, `write_settings`).

pub mod error;
pub mod model;
pub mod settings;
pub mod snapshot;
pub mod vault;

pub use error::{JournalError, Result};
pub use model::{Record, RecordKind};
pub use settings::{Credentials, SyncFrequency, SyncSettings};
pub use snapshot::Snapshot;
pub use vault::{JournalVault, MemoryVault};
