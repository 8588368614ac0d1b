//! # Periodic Sync Scheduler
//!
//! Owns the background timer driving automatic sync. One logical timer
//! exists at a time: arming replaces any previous timer, and disarming
//! cancels it. Cancellation takes effect between ticks, so a cycle that
//! is already running completes normally.
//!
//! The first tick fires one full interval after arming.

use core_journal::SyncFrequency;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct ScheduledTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
    frequency: SyncFrequency,
}

/// Handle to the periodic sync timer. Clones share the same timer slot.
#[derive(Clone, Debug, Default)]
pub struct SyncScheduler {
    slot: Arc<Mutex<Option<ScheduledTask>>>,
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer, replacing any existing one.
    ///
    /// Every `interval`, `tick` is invoked and awaited to completion;
    /// the next sleep starts only after it returns, so slow cycles
    /// delay subsequent ticks instead of piling up.
    pub async fn arm<F, Fut>(&self, frequency: SyncFrequency, interval: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let loop_token = token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        tick().await;
                    }
                }
            }
            debug!("sync timer loop exited");
        });

        let mut slot = self.slot.lock().await;
        if let Some(previous) = slot.take() {
            previous.token.cancel();
        }
        *slot = Some(ScheduledTask {
            token,
            handle,
            frequency,
        });
    }

    /// Cancels the timer. Returns whether a timer was actually armed;
    /// disarming an idle scheduler is a no-op.
    pub async fn disarm(&self) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.take() {
            Some(task) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a timer is currently armed and its loop still running.
    pub async fn is_active(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    /// Frequency the current timer was armed with, if any.
    pub async fn frequency(&self) -> Option<SyncFrequency> {
        self.slot.lock().await.as_ref().map(|task| task.frequency)
    }
}
