//! # Sync Settings
//!
//! The sync configuration document owned by the application's settings
//! screen. The engine reads it at the start of every cycle and writes back
//! only the `lastSync` field after a successful network-mutating cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Credentials
// =============================================================================

/// Static username/password pair sent as an HTTP Basic credential
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Password must never reach logs or error chains.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Sync Frequency
// =============================================================================

/// How often the scheduler fires automatic sync attempts
///
/// Unrecognized wire values fall back to [`SyncFrequency::Hourly`] rather
/// than failing settings deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SyncFrequency {
    #[default]
    Hourly,
    Daily,
    Weekly,
    Manual,
}

impl From<String> for SyncFrequency {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl SyncFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncFrequency::Hourly => "hourly",
            SyncFrequency::Daily => "daily",
            SyncFrequency::Weekly => "weekly",
            SyncFrequency::Manual => "manual",
        }
    }

    /// Scheduler interval for this frequency.
    ///
    /// `Manual` has no interval of its own and takes the hourly default, so a
    /// timer armed despite a manual frequency behaves like the reference
    /// configuration switch.
    pub fn interval(&self) -> Duration {
        match self {
            SyncFrequency::Daily => Duration::from_secs(60 * 60 * 24),
            SyncFrequency::Weekly => Duration::from_secs(60 * 60 * 24 * 7),
            SyncFrequency::Hourly | SyncFrequency::Manual => Duration::from_secs(60 * 60),
        }
    }
}

impl FromStr for SyncFrequency {
    type Err = crate::error::JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(SyncFrequency::Hourly),
            "daily" => Ok(SyncFrequency::Daily),
            "weekly" => Ok(SyncFrequency::Weekly),
            "manual" => Ok(SyncFrequency::Manual),
            _ => Err(crate::error::JournalError::UnknownKind {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SyncFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Sync configuration, persisted by the application settings store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Remote collection URL the backups live under
    pub endpoint: String,

    pub credentials: Credentials,

    /// Master switch; manual and automatic sync both require it
    pub enabled: bool,

    /// Whether the background scheduler may run
    pub auto_sync: bool,

    pub sync_frequency: SyncFrequency,

    /// Completion time of the last successful network-mutating cycle
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncSettings {
    /// Next scheduled attempt, `lastSync + interval`, defined only while
    /// auto-sync can actually fire (enabled, autoSync, and a prior sync).
    pub fn next_scheduled_sync(&self) -> Option<DateTime<Utc>> {
        if !(self.enabled && self.auto_sync) {
            return None;
        }
        let interval = chrono::Duration::from_std(self.sync_frequency.interval()).ok()?;
        self.last_sync.map(|last| last + interval)
    }
}
