//! # Conflict Detection and Resolution
//!
//! ## Overview
//!
//! Decides whether local and remote state diverged since the last
//! successful sync, and if so computes a merged snapshot with a
//! deterministic last-writer-wins policy at whole-record granularity.
//!
//! Detection is per record kind: a kind conflicts when both sides
//! contain at least one record modified after the last sync time.
//! Without a last sync time there is no prior state to conflict with,
//! so detection always reports none.
//!
//! Resolution never drops data silently. Every record present on either
//! side survives the merge unless a strictly newer version of the same
//! id supersedes it; timestamp ties keep the remote copy.

use chrono::{DateTime, Utc};
use core_journal::{Record, RecordKind, Snapshot};
use std::collections::HashMap;

// ============================================================================
// Conflict
// ============================================================================

/// A detected divergence between a local and a remote snapshot.
///
/// Transient: borrows both snapshots and lives only for the sync cycle
/// that detected it.
#[derive(Debug)]
pub struct SyncConflict<'a> {
    /// The local snapshot at detection time.
    pub local: &'a Snapshot,
    /// The remote snapshot at detection time.
    pub remote: &'a Snapshot,
    /// Kinds where both sides changed since the last sync.
    pub kinds: Vec<RecordKind>,
}

impl SyncConflict<'_> {
    /// Wire names of the conflicting kinds, for messages and events.
    pub fn kind_names(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|k| k.as_str()).collect()
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Checks each record kind for concurrent modification on both sides.
///
/// Returns `None` when `last_sync` is absent (first-ever sync) and when
/// no kind shows post-`last_sync` changes on both sides. Kinds whose
/// record lists are structurally identical are never reported, whatever
/// their timestamps say: identical data cannot conflict with itself.
pub fn detect_conflict<'a>(
    local: &'a Snapshot,
    remote: &'a Snapshot,
    last_sync: Option<DateTime<Utc>>,
) -> Option<SyncConflict<'a>> {
    let last_sync = last_sync?;

    let mut kinds = Vec::new();
    for kind in RecordKind::ALL {
        let local_records = local.records(kind);
        let remote_records = remote.records(kind);
        if local_records == remote_records {
            continue;
        }

        let local_changed = local_records.iter().any(|r| r.modified_after(last_sync));
        let remote_changed = remote_records.iter().any(|r| r.modified_after(last_sync));
        if local_changed && remote_changed {
            kinds.push(kind);
        }
    }

    if kinds.is_empty() {
        None
    } else {
        Some(SyncConflict {
            local,
            remote,
            kinds,
        })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Merges two record lists by id with last-writer-wins semantics.
///
/// The map is seeded with the remote records. Local records are then
/// folded in: an id unknown to the remote side is always kept, and an
/// id present on both sides keeps whichever copy has the strictly
/// greater modification time (`updatedAt`, falling back to
/// `createdAt`). Equal timestamps keep the remote copy.
///
/// The output order is unspecified.
pub fn merge_records(local: &[Record], remote: &[Record]) -> Vec<Record> {
    let mut merged: HashMap<&str, &Record> = HashMap::with_capacity(remote.len() + local.len());

    for record in remote {
        merged.insert(record.id.as_str(), record);
    }
    for record in local {
        match merged.get(record.id.as_str()) {
            None => {
                merged.insert(record.id.as_str(), record);
            }
            Some(existing) => {
                if record.modified_at() > existing.modified_at() {
                    merged.insert(record.id.as_str(), record);
                }
            }
        }
    }

    merged.into_values().cloned().collect()
}

/// Produces the merged snapshot for a detected conflict.
///
/// The remote snapshot is the base: non-conflicting kinds and the
/// settings sub-object are taken from it unchanged, while each
/// conflicting kind is replaced by the [`merge_records`] result.
///
/// The returned snapshot carries the remote snapshot's revision stamp;
/// callers persisting it locally must restamp it from their own read.
pub fn resolve_conflict(conflict: &SyncConflict<'_>) -> Snapshot {
    let mut merged = conflict.remote.clone();
    for &kind in &conflict.kinds {
        let records = merge_records(conflict.local.records(kind), conflict.remote.records(kind));
        merged.set_records(kind, records);
    }
    merged
}
