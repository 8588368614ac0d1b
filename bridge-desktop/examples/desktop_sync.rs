//! Sync a local file vault against a real WebDAV server.
//!
//! Requires a reachable server:
//!
//! ```sh
//! export DAYBOOK_DAV_URL="https://dav.example.com/daybook/"
//! export DAYBOOK_DAV_USER="ada"
//! export DAYBOOK_DAV_PASSWORD="s3cret"
//! cargo run -p bridge-desktop --example desktop_sync
//! ```

use anyhow::Context;
use bridge_desktop::{FileVault, ReqwestHttpClient};
use core_journal::{Credentials, JournalVault, SyncSettings};
use core_runtime::events::EventBus;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_sync::{SyncDirection, SyncService};
use provider_webdav::{WebDavConfig, WebDavStore};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::default())?;

    let endpoint = env::var("DAYBOOK_DAV_URL").context("DAYBOOK_DAV_URL is not set")?;
    let username = env::var("DAYBOOK_DAV_USER").context("DAYBOOK_DAV_USER is not set")?;
    let password = env::var("DAYBOOK_DAV_PASSWORD").context("DAYBOOK_DAV_PASSWORD is not set")?;

    let settings = SyncSettings {
        endpoint,
        credentials: Credentials::new(username, password),
        enabled: true,
        ..SyncSettings::default()
    };

    let vault = Arc::new(FileVault::new());
    println!("vault directory: {}", vault.data_dir().display());
    vault.write_settings(&settings).await?;

    let http_client = Arc::new(ReqwestHttpClient::new());
    let store = WebDavStore::new(http_client, WebDavConfig::from_settings(&settings)?);

    let event_bus = EventBus::default();
    let mut events = event_bus.subscribe();
    let service = SyncService::new(vault, Arc::new(store), event_bus);

    if !service.test_connection().await? {
        anyhow::bail!("server rejected the connection probe");
    }

    // Push whatever the local vault holds as a first backup.
    let record = service.trigger_sync(SyncDirection::Upload, false).await?;
    println!("[{}] {}", record.status, record.message);

    println!("\nevents observed:");
    while let Ok(event) = events.try_recv() {
        println!("  [{:?}] {}", event.severity(), event.description());
    }

    Ok(())
}
