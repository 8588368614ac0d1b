//! # Journal Records
//!
//! The unit of user data tracked by the sync engine. Records are opaque to the
//! engine beyond three facts: a stable `id`, a `createdAt` timestamp, and an
//! optional `updatedAt` timestamp. Everything else the application stores on a
//! record travels through the engine untouched.

use crate::error::JournalError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Record Kinds
// =============================================================================

/// The tracked data-type lists of a journal snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Tasks,
    DiaryEntries,
    Goals,
    Habits,
    Summaries,
}

impl RecordKind {
    /// Every tracked kind, in snapshot field order
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Tasks,
        RecordKind::DiaryEntries,
        RecordKind::Goals,
        RecordKind::Habits,
        RecordKind::Summaries,
    ];

    /// Wire/display name of the kind (matches the snapshot JSON field)
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Tasks => "tasks",
            RecordKind::DiaryEntries => "diaryEntries",
            RecordKind::Goals => "goals",
            RecordKind::Habits => "habits",
            RecordKind::Summaries => "summaries",
        }
    }
}

impl FromStr for RecordKind {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasks" => Ok(RecordKind::Tasks),
            "diaryEntries" => Ok(RecordKind::DiaryEntries),
            "goals" => Ok(RecordKind::Goals),
            "habits" => Ok(RecordKind::Habits),
            "summaries" => Ok(RecordKind::Summaries),
            _ => Err(JournalError::UnknownKind {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Record
// =============================================================================

/// One journal record (a task, diary entry, goal, habit, or summary)
///
/// The payload fields beyond the identity/timestamp triple are preserved via
/// `#[serde(flatten)]` and never interpreted by the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Stable identifier, unique within the record's list
    pub id: String,

    /// Creation timestamp (ISO-8601 on the wire)
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp; absent for never-edited records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Application payload, carried opaquely
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record with the given id and creation time and no payload
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            updated_at: None,
            fields: Map::new(),
        }
    }

    /// Set the last-modified timestamp
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Attach a payload field
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Effective modification time: `updatedAt`, falling back to `createdAt`
    /// for records that were never edited after creation.
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Whether the record was modified strictly after `instant`
    pub fn modified_after(&self, instant: DateTime<Utc>) -> bool {
        self.modified_at() > instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_record_kind_round_trip() {
        for kind in RecordKind::ALL {
            let parsed: RecordKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_record_kind_unknown() {
        let result = "recipes".parse::<RecordKind>();
        assert!(matches!(
            result,
            Err(JournalError::UnknownKind { value }) if value == "recipes"
        ));
    }

    #[test]
    fn test_modified_at_falls_back_to_created_at() {
        let record = Record::new("a", at(100));
        assert_eq!(record.modified_at(), at(100));

        let edited = record.with_updated_at(at(250));
        assert_eq!(edited.modified_at(), at(250));
    }

    #[test]
    fn test_modified_after_is_strict() {
        let record = Record::new("a", at(100)).with_updated_at(at(200));
        assert!(record.modified_after(at(199)));
        assert!(!record.modified_after(at(200)));
        assert!(!record.modified_after(at(201)));
    }

    #[test]
    fn test_record_payload_survives_round_trip() {
        let record = Record::new("task-1", at(100))
            .with_updated_at(at(150))
            .with_field("title", json!("Water the plants"))
            .with_field("done", json!(false));

        let encoded = serde_json::to_string(&record).unwrap();
        assert!(encoded.contains("\"createdAt\""));
        assert!(encoded.contains("\"updatedAt\""));
        assert!(encoded.contains("\"title\""));

        let decoded: Record = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.fields["title"], json!("Water the plants"));
    }

    #[test]
    fn test_missing_updated_at_not_serialized() {
        let record = Record::new("a", at(100));
        let encoded = serde_json::to_string(&record).unwrap();
        assert!(!encoded.contains("updatedAt"));

        let decoded: Record = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.updated_at, None);
    }
}
