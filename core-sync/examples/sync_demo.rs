//! End-to-end walk through the sync engine against in-memory stores.
//!
//! Run with:
//!
//! ```sh
//! cargo run -p core-sync --example sync_demo
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_journal::{MemoryVault, Record, RecordKind, Snapshot, SyncSettings};
use core_runtime::events::EventBus;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_sync::{RemoteStore, Result as SyncResult, SyncDirection, SyncService};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Remote store backed by a growing in-memory list of backups.
#[derive(Default)]
struct MemoryRemote {
    backups: Mutex<Vec<(Snapshot, DateTime<Utc>)>>,
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn test_connection(&self) -> SyncResult<bool> {
        Ok(true)
    }

    async fn upload_snapshot(&self, snapshot: &Snapshot) -> SyncResult<()> {
        let mut backups = self.backups.lock().unwrap();
        backups.push((snapshot.clone(), Utc::now()));
        Ok(())
    }

    async fn download_latest_snapshot(&self) -> SyncResult<Option<(Snapshot, DateTime<Utc>)>> {
        let backups = self.backups.lock().unwrap();
        Ok(backups.last().cloned())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::default())?;

    // Local vault with a couple of records and sync enabled.
    let vault = MemoryVault::with_settings(SyncSettings {
        endpoint: "memory://demo".to_string(),
        enabled: true,
        auto_sync: false,
        ..SyncSettings::default()
    });
    vault
        .seed_snapshot(
            Snapshot::default()
                .with_records(
                    RecordKind::Tasks,
                    vec![Record::new("task-1", Utc::now())
                        .with_field("title", json!("Water the plants"))],
                )
                .with_records(
                    RecordKind::Goals,
                    vec![Record::new("goal-1", Utc::now())
                        .with_field("title", json!("Read 12 books"))],
                ),
        )
        .await;

    let event_bus = EventBus::default();
    let mut events = event_bus.subscribe();
    let service = SyncService::new(
        Arc::new(vault),
        Arc::new(MemoryRemote::default()),
        event_bus,
    );

    println!("remote reachable: {}", service.test_connection().await?);

    // Manual upload pushes the first backup.
    let record = service.trigger_sync(SyncDirection::Upload, false).await?;
    println!("[{}] {}", record.status, record.message);

    // Nothing changed since, so the incremental pass stays offline.
    let record = service.perform_incremental_sync().await?;
    println!("[{}] {}", record.status, record.message);

    let status = service.get_status().await?;
    println!(
        "state: {:?}, last sync: {:?}, next: {:?}",
        status.state, status.last_sync, status.next_scheduled_sync
    );

    println!("\nhistory (most recent first):");
    for record in service.get_history().await {
        println!(
            "  {} {} [{}] {}",
            record.timestamp.format("%H:%M:%S"),
            record.trigger,
            record.status,
            record.message
        );
    }

    println!("\nevents observed:");
    while let Ok(event) = events.try_recv() {
        println!("  [{:?}] {}", event.severity(), event.description());
    }

    Ok(())
}
