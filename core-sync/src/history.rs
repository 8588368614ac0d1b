//! # Sync History
//!
//! Bounded audit log of sync attempts. Every completed cycle, successful
//! or not, appends one immutable [`SyncRecord`]; the log keeps the most
//! recent [`HISTORY_LIMIT`] entries and silently drops the oldest beyond
//! that.

use chrono::{DateTime, Utc};
use core_journal::RecordKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Maximum number of history entries retained.
pub const HISTORY_LIMIT: usize = 50;

// ============================================================================
// Record Types
// ============================================================================

/// What initiated a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncTrigger {
    Manual,
    Auto,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Manual => "manual",
            SyncTrigger::Auto => "auto",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit entry describing a finished sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    /// Unique id of this attempt.
    pub id: Uuid,

    /// When the attempt finished.
    pub timestamp: DateTime<Utc>,

    /// What initiated the attempt.
    pub trigger: SyncTrigger,

    /// Outcome.
    pub status: SyncStatus,

    /// Human-readable outcome summary, or the error message on failure.
    pub message: String,

    /// Record kinds touched by the attempt. Empty for failures and
    /// no-change cycles.
    pub data_types: Vec<RecordKind>,

    /// Wall-clock duration of the attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl SyncRecord {
    /// Builds a success record stamped with the current time.
    pub fn success(
        trigger: SyncTrigger,
        message: impl Into<String>,
        data_types: Vec<RecordKind>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            trigger,
            status: SyncStatus::Success,
            message: message.into(),
            data_types,
            duration_ms: Some(duration_ms),
        }
    }

    /// Builds a failure record stamped with the current time.
    pub fn failure(trigger: SyncTrigger, message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            trigger,
            status: SyncStatus::Failed,
            message: message.into(),
            data_types: Vec::new(),
            duration_ms: Some(duration_ms),
        }
    }

    /// Whether the attempt succeeded.
    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

// ============================================================================
// History Log
// ============================================================================

/// Bounded, most-recent-first log of [`SyncRecord`]s.
#[derive(Debug, Default)]
pub struct SyncHistory {
    records: VecDeque<SyncRecord>,
}

impl SyncHistory {
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Appends a record as the most recent entry, dropping the oldest
    /// once the log exceeds [`HISTORY_LIMIT`].
    pub fn push(&mut self, record: SyncRecord) {
        self.records.push_front(record);
        while self.records.len() > HISTORY_LIMIT {
            self.records.pop_back();
        }
    }

    /// All retained records, most recent first.
    pub fn records(&self) -> Vec<SyncRecord> {
        self.records.iter().cloned().collect()
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Option<&SyncRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_message(message: &str) -> SyncRecord {
        SyncRecord::success(SyncTrigger::Auto, message, vec![RecordKind::Tasks], 10)
    }

    #[test]
    fn test_history_is_most_recent_first() {
        let mut history = SyncHistory::new();
        history.push(record_with_message("first"));
        history.push(record_with_message("second"));
        history.push(record_with_message("third"));

        let records = history.records();
        assert_eq!(records[0].message, "third");
        assert_eq!(records[2].message, "first");
        assert_eq!(history.latest().unwrap().message, "third");
    }

    #[test]
    fn test_history_caps_at_limit_dropping_oldest() {
        let mut history = SyncHistory::new();
        for i in 0..HISTORY_LIMIT {
            history.push(record_with_message(&format!("entry {i}")));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);

        history.push(record_with_message("one past the cap"));
        assert_eq!(history.len(), HISTORY_LIMIT);

        let records = history.records();
        assert_eq!(records[0].message, "one past the cap");
        // "entry 0" was the oldest and must be gone.
        assert!(records.iter().all(|r| r.message != "entry 0"));
        assert_eq!(records[HISTORY_LIMIT - 1].message, "entry 1");
    }

    #[test]
    fn test_success_and_failure_constructors() {
        let ok = SyncRecord::success(
            SyncTrigger::Manual,
            "uploaded snapshot",
            vec![RecordKind::Tasks, RecordKind::Goals],
            420,
        );
        assert!(ok.is_success());
        assert_eq!(ok.duration_ms, Some(420));
        assert_eq!(ok.data_types.len(), 2);

        let failed = SyncRecord::failure(SyncTrigger::Auto, "server unreachable", 84);
        assert!(!failed.is_success());
        assert!(failed.data_types.is_empty());
        assert_ne!(ok.id, failed.id);
    }

    #[test]
    fn test_record_serialization_shape() {
        let record = SyncRecord::success(SyncTrigger::Auto, "done", vec![RecordKind::Habits], 5);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["trigger"], "auto");
        assert_eq!(value["status"], "success");
        assert_eq!(value["dataTypes"][0], "habits");
        assert_eq!(value["durationMs"], 5);
    }
}
