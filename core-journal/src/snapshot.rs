//! # Journal Snapshot
//!
//! The unit of synchronization: every tracked record list plus the
//! application settings sub-object, serialized as one JSON document. A
//! snapshot is a value object; the engine builds a fresh one on every vault
//! read and never mutates one in place across await points.
//!
//! The `revision` stamp is vault-local bookkeeping (see
//! [`JournalVault::write_all`](crate::vault::JournalVault::write_all)) and is
//! excluded from the wire format.

use crate::model::{Record, RecordKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Complete local application state, as one sync unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// Vault revision this snapshot was read at; never serialized
    #[serde(skip)]
    pub revision: u64,

    pub tasks: Vec<Record>,
    pub diary_entries: Vec<Record>,
    pub goals: Vec<Record>,
    pub habits: Vec<Record>,
    pub summaries: Vec<Record>,

    /// Application settings sub-object, carried opaquely
    pub settings: Map<String, Value>,
}

impl Snapshot {
    /// The record list for `kind`
    pub fn records(&self, kind: RecordKind) -> &[Record] {
        match kind {
            RecordKind::Tasks => &self.tasks,
            RecordKind::DiaryEntries => &self.diary_entries,
            RecordKind::Goals => &self.goals,
            RecordKind::Habits => &self.habits,
            RecordKind::Summaries => &self.summaries,
        }
    }

    /// Replace the record list for `kind`
    pub fn set_records(&mut self, kind: RecordKind, records: Vec<Record>) {
        match kind {
            RecordKind::Tasks => self.tasks = records,
            RecordKind::DiaryEntries => self.diary_entries = records,
            RecordKind::Goals => self.goals = records,
            RecordKind::Habits => self.habits = records,
            RecordKind::Summaries => self.summaries = records,
        }
    }

    /// Builder-style variant of [`set_records`](Self::set_records)
    pub fn with_records(mut self, kind: RecordKind, records: Vec<Record>) -> Self {
        self.set_records(kind, records);
        self
    }

    /// Total number of records across every kind
    pub fn record_count(&self) -> usize {
        RecordKind::ALL
            .iter()
            .map(|kind| self.records(*kind).len())
            .sum()
    }

    /// Kinds that currently hold at least one record
    pub fn populated_kinds(&self) -> Vec<RecordKind> {
        RecordKind::ALL
            .into_iter()
            .filter(|kind| !self.records(*kind).is_empty())
            .collect()
    }

    /// Kinds holding at least one record modified strictly after `instant`
    pub fn changed_kinds_since(&self, instant: DateTime<Utc>) -> Vec<RecordKind> {
        RecordKind::ALL
            .into_iter()
            .filter(|kind| {
                self.records(*kind)
                    .iter()
                    .any(|record| record.modified_after(instant))
            })
            .collect()
    }

    /// Number of records modified strictly after `instant`, across all kinds
    pub fn changed_record_count_since(&self, instant: DateTime<Utc>) -> usize {
        RecordKind::ALL
            .iter()
            .map(|kind| {
                self.records(*kind)
                    .iter()
                    .filter(|record| record.modified_after(instant))
                    .count()
            })
            .sum()
    }
}
