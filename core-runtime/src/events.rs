//! # Core Event Bus
//!
//! ## Overview
//!
//! Broadcast channel over which the engine announces sync lifecycle and
//! scheduler transitions. Hosts subscribe to drive status indicators or
//! activity logs; the engine never waits on subscribers, and events are
//! dropped silently when nobody is listening.
//!
//! Every event serializes with a stable `type`/`payload` envelope so it
//! can cross a process or FFI boundary as JSON unchanged.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! let bus = EventBus::default();
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Sync(SyncEvent::Started {
//!     trigger: "manual".to_string(),
//!     direction: Some("upload".to_string()),
//! }))
//! .ok();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("[{:?}] {}", event.severity(), event.description());
//! }
//! ```

use core_journal::{RecordKind, SyncFrequency};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Default capacity of the broadcast channel backing an [`EventBus`].
///
/// Slow subscribers that fall more than this many events behind receive
/// a `Lagged` error from their receiver and skip ahead.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Coarse severity attached to every event, for hosts that route events
/// into their own logging or notification facilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// Top-level event envelope.
///
/// Serialized as `{"type": "sync", "payload": {...}}` so subscribers on
/// the other side of a JSON boundary can dispatch on `type` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum CoreEvent {
    /// Sync engine lifecycle.
    Sync(SyncEvent),
    /// Background scheduler transitions.
    Scheduler(SchedulerEvent),
}

/// Events emitted during a sync cycle, from first network touch to the
/// recorded outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SyncEvent {
    /// A sync cycle began.
    #[serde(rename_all = "camelCase")]
    Started {
        /// What initiated the cycle (`"manual"` or `"auto"`).
        trigger: String,
        /// Requested direction for manual syncs, absent for automatic ones.
        #[serde(skip_serializing_if = "Option::is_none")]
        direction: Option<String>,
    },

    /// A sync cycle finished and its outcome was recorded.
    #[serde(rename_all = "camelCase")]
    Completed {
        /// Human-readable outcome summary.
        message: String,
        /// Wall-clock duration of the cycle.
        duration_ms: u64,
    },

    /// A sync cycle failed.
    Failed { message: String },

    /// An automatic cycle exited early without touching the network.
    Skipped { reason: String },

    /// Both sides changed the same record kinds since the last sync.
    #[serde(rename_all = "camelCase")]
    ConflictDetected { kinds: Vec<RecordKind> },
}

/// Events describing the automatic sync scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SchedulerEvent {
    /// The periodic timer was armed.
    #[serde(rename_all = "camelCase")]
    Armed {
        frequency: SyncFrequency,
        interval_secs: u64,
    },

    /// The periodic timer was cancelled.
    Stopped,
}

impl CoreEvent {
    /// Short human-readable description, suitable for log lines.
    pub fn description(&self) -> String {
        match self {
            CoreEvent::Sync(event) => match event {
                SyncEvent::Started { trigger, direction } => match direction {
                    Some(direction) => format!("{trigger} sync started ({direction})"),
                    None => format!("{trigger} sync started"),
                },
                SyncEvent::Completed {
                    message,
                    duration_ms,
                } => format!("sync completed in {duration_ms}ms: {message}"),
                SyncEvent::Failed { message } => format!("sync failed: {message}"),
                SyncEvent::Skipped { reason } => format!("sync skipped: {reason}"),
                SyncEvent::ConflictDetected { kinds } => {
                    let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
                    format!("sync conflict detected in {}", names.join(", "))
                }
            },
            CoreEvent::Scheduler(event) => match event {
                SchedulerEvent::Armed {
                    frequency,
                    interval_secs,
                } => format!("auto-sync armed ({frequency}, every {interval_secs}s)"),
                SchedulerEvent::Stopped => "auto-sync stopped".to_string(),
            },
        }
    }

    /// Severity bucket for this event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::ConflictDetected { .. }) => EventSeverity::Warning,
            _ => EventSeverity::Info,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Fan-out broadcast bus for [`CoreEvent`]s.
///
/// Cloning the bus is cheap and every clone feeds the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a bus whose channel buffers up to `capacity` events per
    /// subscriber before lagging them.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received the event. With
    /// no subscribers the event is dropped and an error is returned;
    /// callers that treat events as fire-and-forget use `emit(..).ok()`.
    pub fn emit(
        &self,
        event: CoreEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Registers a new subscriber receiving every event emitted from
    /// this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let delivered = bus
            .emit(CoreEvent::Sync(SyncEvent::Failed {
                message: "backup endpoint unreachable".to_string(),
            }))
            .unwrap();
        assert_eq!(delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.severity(), EventSeverity::Error);
        assert!(event.description().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(8);
        let result = bus.emit(CoreEvent::Scheduler(SchedulerEvent::Stopped));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_subscriber_count_tracks_receivers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);

        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        drop(rx2);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_envelope_serialization() {
        let event = CoreEvent::Sync(SyncEvent::Completed {
            message: "uploaded snapshot".to_string(),
            duration_ms: 420,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "sync");
        assert_eq!(value["payload"]["event"], "completed");
        assert_eq!(value["payload"]["durationMs"], 420);
    }

    #[test]
    fn test_conflict_event_carries_wire_kind_names() {
        let event = CoreEvent::Sync(SyncEvent::ConflictDetected {
            kinds: vec![RecordKind::Tasks, RecordKind::DiaryEntries],
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["payload"]["kinds"][0], "tasks");
        assert_eq!(value["payload"]["kinds"][1], "diaryEntries");
    }

    #[test]
    fn test_scheduler_armed_serialization() {
        let event = CoreEvent::Scheduler(SchedulerEvent::Armed {
            frequency: SyncFrequency::Daily,
            interval_secs: 86_400,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "scheduler");
        assert_eq!(value["payload"]["event"], "armed");
        assert_eq!(value["payload"]["frequency"], "daily");
        assert_eq!(value["payload"]["intervalSecs"], 86_400);
    }

    #[test]
    fn test_started_event_omits_absent_direction() {
        let event = CoreEvent::Sync(SyncEvent::Started {
            trigger: "auto".to_string(),
            direction: None,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert!(value["payload"].get("direction").is_none());
    }

    #[test]
    fn test_severity_buckets() {
        let failed = CoreEvent::Sync(SyncEvent::Failed {
            message: "x".to_string(),
        });
        let conflict = CoreEvent::Sync(SyncEvent::ConflictDetected {
            kinds: vec![RecordKind::Goals],
        });
        let stopped = CoreEvent::Scheduler(SchedulerEvent::Stopped);

        assert_eq!(failed.severity(), EventSeverity::Error);
        assert_eq!(conflict.severity(), EventSeverity::Warning);
        assert_eq!(stopped.severity(), EventSeverity::Info);
    }
}
