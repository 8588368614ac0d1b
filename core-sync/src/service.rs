//! # Sync Orchestrator
//!
//! ## Overview
//!
//! Top-level sync engine. Sequences full sync cycles against the remote
//! store, enforces single-flight execution through [`SyncGate`], manages
//! the periodic scheduler, and maintains the bounded history log.
//!
//! Three entry points exist:
//!
//! - [`SyncService::trigger_sync`] — explicit user action with a fixed
//!   direction. No conflict checking; errors propagate to the caller.
//! - [`SyncService::perform_auto_sync`] — the scheduled cycle. Compares
//!   both sides, detects and merges conflicts, and never surfaces an
//!   error: failures become history records.
//! - [`SyncService::perform_incremental_sync`] — uploads only when local
//!   records changed since the last sync, otherwise completes without
//!   touching the network.
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::service::{SyncDirection, SyncService};
//!
//! let service = SyncService::new(vault, remote, event_bus);
//! service.start_auto_sync().await?;
//!
//! let record = service.trigger_sync(SyncDirection::Upload, false).await?;
//! println!("{}: {}", record.status, record.message);
//! ```

use crate::conflict::{detect_conflict, resolve_conflict};
use crate::error::{Result, SyncError};
use crate::gate::SyncGate;
use crate::history::{SyncHistory, SyncRecord, SyncTrigger};
use crate::remote::RemoteStore;
use crate::scheduler::SyncScheduler;
use chrono::{DateTime, Utc};
use core_journal::{JournalError, JournalVault, RecordKind, Snapshot, SyncSettings};
use core_runtime::events::{CoreEvent, EventBus, SchedulerEvent, SyncEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// How many times an automatic cycle re-reads local state and retries
/// after the vault rejects a write because of a concurrent local edit.
const LOCAL_WRITE_ATTEMPTS: u32 = 3;

// ============================================================================
// Public Types
// ============================================================================

/// Direction of a manual sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Upload,
    Download,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Upload => "upload",
            SyncDirection::Download => "download",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Live engine state exposed through [`SyncStatusReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Syncing,
}

/// Point-in-time status surface for hosts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusReport {
    /// Completion time of the last successful network-mutating cycle.
    pub last_sync: Option<DateTime<Utc>>,
    /// Whether a cycle is running right now.
    pub state: SyncState,
    /// Next scheduled attempt, present only while auto-sync is enabled
    /// and at least one sync has completed.
    pub next_scheduled_sync: Option<DateTime<Utc>>,
}

/// What a finished cycle did, before it is stamped into a record.
struct CycleOutcome {
    message: String,
    data_types: Vec<RecordKind>,
}

/// Outcome of one automatic cycle body.
enum AutoOutcome {
    Completed(CycleOutcome),
    Skipped(&'static str),
}

// ============================================================================
// Service
// ============================================================================

/// The sync engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SyncService {
    vault: Arc<dyn JournalVault>,
    remote: Arc<dyn RemoteStore>,
    gate: SyncGate,
    scheduler: SyncScheduler,
    history: Arc<Mutex<SyncHistory>>,
    event_bus: EventBus,
}

impl SyncService {
    pub fn new(
        vault: Arc<dyn JournalVault>,
        remote: Arc<dyn RemoteStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            vault,
            remote,
            gate: SyncGate::new(),
            scheduler: SyncScheduler::new(),
            history: Arc::new(Mutex::new(SyncHistory::new())),
            event_bus,
        }
    }

    // ------------------------------------------------------------------
    // Manual sync
    // ------------------------------------------------------------------

    /// Runs a sync in the given direction, bypassing conflict logic.
    ///
    /// Fails fast with [`SyncError::NotEnabled`] when sync is disabled
    /// in settings and with [`SyncError::SyncInProgress`] when another
    /// cycle holds the gate, unless `force` is set, in which case the
    /// cycle proceeds ungated.
    ///
    /// # Errors
    ///
    /// Cycle failures are appended to history as failed records and
    /// then propagated, so the UI can present them directly.
    #[instrument(skip(self))]
    pub async fn trigger_sync(&self, direction: SyncDirection, force: bool) -> Result<SyncRecord> {
        let settings = self.vault.read_settings().await?;
        if !settings.enabled {
            return Err(SyncError::NotEnabled);
        }

        let permit = self.gate.try_acquire();
        if permit.is_none() {
            if !force {
                return Err(SyncError::SyncInProgress);
            }
            warn!("forcing manual sync while another cycle is running");
        }

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Started {
                trigger: SyncTrigger::Manual.as_str().to_string(),
                direction: Some(direction.as_str().to_string()),
            }))
            .ok();

        let started = Instant::now();
        let outcome = match direction {
            SyncDirection::Upload => self.upload_cycle().await,
            SyncDirection::Download => self.download_cycle().await,
        };

        match outcome {
            Ok(outcome) => Ok(self
                .record_success(SyncTrigger::Manual, started, outcome)
                .await),
            Err(e) => {
                self.record_failure(SyncTrigger::Manual, started, &e).await;
                Err(e)
            }
        }
    }

    async fn upload_cycle(&self) -> Result<CycleOutcome> {
        let snapshot = self.vault.read_all().await?;
        self.remote.upload_snapshot(&snapshot).await?;
        self.mark_synced().await?;

        info!(records = snapshot.record_count(), "uploaded local snapshot");
        Ok(CycleOutcome {
            message: format!("uploaded local snapshot ({} records)", snapshot.record_count()),
            data_types: snapshot.populated_kinds(),
        })
    }

    async fn download_cycle(&self) -> Result<CycleOutcome> {
        let (remote_snapshot, _modified) = self
            .remote
            .download_latest_snapshot()
            .await?
            .ok_or(SyncError::NoBackupFound)?;

        self.overwrite_local(&remote_snapshot).await?;
        self.mark_synced().await?;

        info!(
            records = remote_snapshot.record_count(),
            "downloaded latest backup"
        );
        Ok(CycleOutcome {
            message: format!(
                "downloaded latest backup ({} records)",
                remote_snapshot.record_count()
            ),
            data_types: remote_snapshot.populated_kinds(),
        })
    }

    // ------------------------------------------------------------------
    // Automatic sync
    // ------------------------------------------------------------------

    /// Runs one automatic cycle.
    ///
    /// Skips silently (returning `None`) when another cycle is running,
    /// when sync is disabled, and when there is nothing to do. Every
    /// other outcome, success or failure, is appended to history and
    /// returned; errors never propagate.
    #[instrument(skip(self))]
    pub async fn perform_auto_sync(&self) -> Option<SyncRecord> {
        let Some(_permit) = self.gate.try_acquire() else {
            debug!("skipping automatic sync, another cycle is in progress");
            self.emit_skipped("another sync is in progress");
            return None;
        };

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Started {
                trigger: SyncTrigger::Auto.as_str().to_string(),
                direction: None,
            }))
            .ok();

        let started = Instant::now();
        match self.auto_cycle().await {
            Ok(AutoOutcome::Completed(outcome)) => {
                Some(self.record_success(SyncTrigger::Auto, started, outcome).await)
            }
            Ok(AutoOutcome::Skipped(reason)) => {
                debug!(reason, "automatic sync ended without network writes");
                self.emit_skipped(reason);
                None
            }
            Err(e) => {
                warn!(error = %e, "automatic sync failed");
                Some(self.record_failure(SyncTrigger::Auto, started, &e).await)
            }
        }
    }

    /// Cycle body. Re-reads local state and retries a bounded number of
    /// times when a concurrent local edit invalidates the write-back.
    async fn auto_cycle(&self) -> Result<AutoOutcome> {
        let settings = self.vault.read_settings().await?;
        if !settings.enabled {
            return Ok(AutoOutcome::Skipped("sync is disabled"));
        }
        let last_sync = settings.last_sync;

        let remote = self.remote.download_latest_snapshot().await?;

        let mut attempt = 1;
        loop {
            let local = self.vault.read_all().await?;
            match self.auto_step(local, remote.clone(), last_sync).await {
                Err(SyncError::Vault(JournalError::RevisionConflict { .. }))
                    if attempt < LOCAL_WRITE_ATTEMPTS =>
                {
                    attempt += 1;
                    debug!(attempt, "local snapshot changed mid-cycle, re-reading");
                }
                outcome => return outcome,
            }
        }
    }

    /// One pass of the automatic decision tree against a fixed pair of
    /// local and remote snapshots.
    async fn auto_step(
        &self,
        local: Snapshot,
        remote: Option<(Snapshot, DateTime<Utc>)>,
        last_sync: Option<DateTime<Utc>>,
    ) -> Result<AutoOutcome> {
        if let Some((remote_snapshot, remote_modified)) = remote {
            let remote_newer = last_sync.map_or(true, |at| remote_modified > at);
            if remote_newer {
                // First-ever sync skips detection entirely: there is no
                // prior state to conflict with.
                let conflict = if last_sync.is_some() {
                    detect_conflict(&local, &remote_snapshot, last_sync)
                } else {
                    None
                };

                return match conflict {
                    None => {
                        let mut replacement = remote_snapshot.clone();
                        replacement.revision = local.revision;
                        self.vault.write_all(&replacement).await?;
                        self.mark_synced().await?;

                        info!(
                            records = replacement.record_count(),
                            "downloaded newer remote snapshot"
                        );
                        Ok(AutoOutcome::Completed(CycleOutcome {
                            message: format!(
                                "downloaded newer remote snapshot ({} records)",
                                replacement.record_count()
                            ),
                            data_types: replacement.populated_kinds(),
                        }))
                    }
                    Some(conflict) => {
                        let kinds = conflict.kinds.clone();
                        warn!(kinds = ?conflict.kind_names(), "concurrent changes detected, merging");
                        self.event_bus
                            .emit(CoreEvent::Sync(SyncEvent::ConflictDetected {
                                kinds: kinds.clone(),
                            }))
                            .ok();

                        let mut merged = resolve_conflict(&conflict);
                        merged.revision = local.revision;
                        self.vault.write_all(&merged).await?;
                        // The merge is the terminal state for both sides.
                        self.remote
                            .upload_snapshot(&merged)
                            .await
                            .map_err(|e| SyncError::ConflictResolution(e.to_string()))?;
                        self.mark_synced().await?;

                        Ok(AutoOutcome::Completed(CycleOutcome {
                            message: format!(
                                "merged concurrent changes in {}",
                                conflict.kind_names().join(", ")
                            ),
                            data_types: kinds,
                        }))
                    }
                };
            }
        }

        // Local is at least as new as the remote, or no backup exists.
        let changed = match last_sync {
            Some(at) => local.changed_kinds_since(at),
            None => local.populated_kinds(),
        };
        if changed.is_empty() {
            return Ok(AutoOutcome::Skipped("no changes since last sync"));
        }

        self.remote.upload_snapshot(&local).await?;
        self.mark_synced().await?;

        let names: Vec<&str> = changed.iter().map(|k| k.as_str()).collect();
        info!(kinds = ?names, "uploaded local changes");
        Ok(AutoOutcome::Completed(CycleOutcome {
            message: format!("uploaded local changes in {}", names.join(", ")),
            data_types: changed,
        }))
    }

    // ------------------------------------------------------------------
    // Incremental sync
    // ------------------------------------------------------------------

    /// Uploads the snapshot only when local records changed since the
    /// last sync; otherwise records a "no changes" success without any
    /// network call. Without a prior sync it uploads unconditionally.
    ///
    /// # Errors
    ///
    /// Propagates failures after recording them, like a manual sync.
    #[instrument(skip(self))]
    pub async fn perform_incremental_sync(&self) -> Result<SyncRecord> {
        let settings = self.vault.read_settings().await?;
        if !settings.enabled {
            return Err(SyncError::NotEnabled);
        }
        let Some(_permit) = self.gate.try_acquire() else {
            return Err(SyncError::SyncInProgress);
        };

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Started {
                trigger: SyncTrigger::Auto.as_str().to_string(),
                direction: Some(SyncDirection::Upload.as_str().to_string()),
            }))
            .ok();

        let started = Instant::now();
        match self.incremental_cycle(&settings).await {
            Ok(outcome) => Ok(self.record_success(SyncTrigger::Auto, started, outcome).await),
            Err(e) => {
                self.record_failure(SyncTrigger::Auto, started, &e).await;
                Err(e)
            }
        }
    }

    async fn incremental_cycle(&self, settings: &SyncSettings) -> Result<CycleOutcome> {
        let local = self.vault.read_all().await?;
        let (changed, first_sync) = match settings.last_sync {
            None => (local.populated_kinds(), true),
            Some(at) => (local.changed_kinds_since(at), false),
        };

        if !first_sync && changed.is_empty() {
            debug!("no local changes since last sync, skipping upload");
            return Ok(CycleOutcome {
                message: "no changes to sync".to_string(),
                data_types: Vec::new(),
            });
        }

        self.remote.upload_snapshot(&local).await?;
        self.mark_synced().await?;

        let message = if first_sync {
            format!(
                "first sync, uploaded full snapshot ({} records)",
                local.record_count()
            )
        } else {
            let names: Vec<&str> = changed.iter().map(|k| k.as_str()).collect();
            format!("uploaded changes in {}", names.join(", "))
        };
        Ok(CycleOutcome {
            message,
            data_types: changed,
        })
    }

    // ------------------------------------------------------------------
    // Scheduler
    // ------------------------------------------------------------------

    /// Reads settings and arms the periodic timer when both `enabled`
    /// and `autoSync` are set, cancelling any previous timer first.
    ///
    /// Returns whether a timer was armed.
    #[instrument(skip(self))]
    pub async fn start_auto_sync(&self) -> Result<bool> {
        if self.scheduler.disarm().await {
            self.event_bus
                .emit(CoreEvent::Scheduler(SchedulerEvent::Stopped))
                .ok();
        }

        let settings = self.vault.read_settings().await?;
        if !(settings.enabled && settings.auto_sync) {
            debug!(
                enabled = settings.enabled,
                auto_sync = settings.auto_sync,
                "auto-sync not armed"
            );
            return Ok(false);
        }

        let frequency = settings.sync_frequency;
        let interval = frequency.interval();
        let service = self.clone();
        self.scheduler
            .arm(frequency, interval, move || {
                let service = service.clone();
                async move {
                    service.perform_auto_sync().await;
                }
            })
            .await;

        self.event_bus
            .emit(CoreEvent::Scheduler(SchedulerEvent::Armed {
                frequency,
                interval_secs: interval.as_secs(),
            }))
            .ok();
        info!(%frequency, interval_secs = interval.as_secs(), "auto-sync armed");
        Ok(true)
    }

    /// Cancels the periodic timer. A cycle already in flight completes;
    /// calling this while inactive is a no-op.
    pub async fn stop_auto_sync(&self) {
        if self.scheduler.disarm().await {
            self.event_bus
                .emit(CoreEvent::Scheduler(SchedulerEvent::Stopped))
                .ok();
            info!("auto-sync stopped");
        }
    }

    /// Whether the periodic timer is armed.
    pub async fn is_auto_sync_active(&self) -> bool {
        self.scheduler.is_active().await
    }

    // ------------------------------------------------------------------
    // Status surface
    // ------------------------------------------------------------------

    /// Probes the remote store for reachability and valid credentials.
    pub async fn test_connection(&self) -> Result<bool> {
        self.remote.test_connection().await
    }

    /// Current engine status.
    pub async fn get_status(&self) -> Result<SyncStatusReport> {
        let settings = self.vault.read_settings().await?;
        let state = if self.gate.is_held() {
            SyncState::Syncing
        } else {
            SyncState::Idle
        };
        Ok(SyncStatusReport {
            last_sync: settings.last_sync,
            state,
            next_scheduled_sync: settings.next_scheduled_sync(),
        })
    }

    /// Retained sync records, most recent first.
    pub async fn get_history(&self) -> Vec<SyncRecord> {
        self.history.lock().await.records()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Stamps `lastSync` to now via a settings read-modify-write.
    async fn mark_synced(&self) -> Result<()> {
        let mut settings = self.vault.read_settings().await?;
        settings.last_sync = Some(Utc::now());
        self.vault.write_settings(&settings).await?;
        Ok(())
    }

    /// Replaces local state with `incoming`, restamped onto the current
    /// local revision.
    async fn overwrite_local(&self, incoming: &Snapshot) -> Result<()> {
        let current = self.vault.read_all().await?;
        let mut replacement = incoming.clone();
        replacement.revision = current.revision;
        self.vault.write_all(&replacement).await?;
        Ok(())
    }

    async fn record_success(
        &self,
        trigger: SyncTrigger,
        started: Instant,
        outcome: CycleOutcome,
    ) -> SyncRecord {
        let duration_ms = started.elapsed().as_millis() as u64;
        let record = SyncRecord::success(
            trigger,
            outcome.message.clone(),
            outcome.data_types,
            duration_ms,
        );
        self.history.lock().await.push(record.clone());
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Completed {
                message: outcome.message,
                duration_ms,
            }))
            .ok();
        record
    }

    async fn record_failure(
        &self,
        trigger: SyncTrigger,
        started: Instant,
        error: &SyncError,
    ) -> SyncRecord {
        let duration_ms = started.elapsed().as_millis() as u64;
        let message = error.to_string();
        let record = SyncRecord::failure(trigger, message.clone(), duration_ms);
        self.history.lock().await.push(record.clone());
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Failed { message }))
            .ok();
        record
    }

    fn emit_skipped(&self, reason: &str) {
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Skipped {
                reason: reason.to_string(),
            }))
            .ok();
    }
}

impl fmt::Debug for SyncService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncService")
            .field("vault", &"Arc<dyn JournalVault>")
            .field("remote", &"Arc<dyn RemoteStore>")
            .field("gate", &self.gate)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
