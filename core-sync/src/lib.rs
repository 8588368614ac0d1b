//! # Core Sync
//!
//! ## Overview
//!
//! The data synchronization engine: keeps a user's journal data (tasks,
//! diary entries, goals, habits, summaries) consistent between the local
//! vault and a remote file-based backup store.
//!
//! The engine is deliberately small and sequential. One cycle fetches
//! the newest remote backup, decides between download, merge, and
//! upload, persists the result, and appends an audit record. A gate
//! keeps cycles single-flight and a scheduler fires them periodically.
//!
//! ## Modules
//!
//! - [`service`] — the [`SyncService`] orchestrator and status surface
//! - [`conflict`] — detection and last-writer-wins merge resolution
//! - [`remote`] — the [`RemoteStore`] transport contract
//! - [`scheduler`] — the periodic timer behind auto-sync
//! - [`gate`] — single-flight permit
//! - [`history`] — bounded audit log
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::{SyncDirection, SyncService};
//!
//! let service = SyncService::new(vault, remote, event_bus);
//! service.start_auto_sync().await?;
//! let record = service.trigger_sync(SyncDirection::Upload, false).await?;
//! ```

pub mod conflict;
pub mod error;
pub mod gate;
pub mod history;
pub mod remote;
pub mod scheduler;
pub mod service;

pub use conflict::{detect_conflict, merge_records, resolve_conflict, SyncConflict};
pub use error::{Result, SyncError};
pub use history::{SyncRecord, SyncStatus, SyncTrigger, HISTORY_LIMIT};
pub use remote::RemoteStore;
pub use service::{SyncDirection, SyncService, SyncState, SyncStatusReport};
