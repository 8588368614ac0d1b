//! # Single-Flight Gate
//!
//! Advisory in-progress lock ensuring at most one sync cycle runs at a
//! time. Acquisition never waits: a cycle either takes the permit or
//! observes that one is held and decides what to do (automatic cycles
//! skip, manual cycles fail unless forced).
//!
//! The permit releases on drop, so the flag clears on every exit path
//! of a cycle, including errors and panics.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Clonable handle to the single-flight lock. All clones share one
/// underlying permit.
#[derive(Clone, Debug, Default)]
pub struct SyncGate {
    inner: Arc<Mutex<()>>,
}

/// RAII permit proving the holder is the only running sync cycle.
pub struct SyncPermit {
    _guard: OwnedMutexGuard<()>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to take the permit without waiting.
    pub fn try_acquire(&self) -> Option<SyncPermit> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .ok()
            .map(|guard| SyncPermit { _guard: guard })
    }

    /// Whether a permit is currently held.
    ///
    /// Advisory only: the answer can be stale by the time the caller
    /// acts on it. Used for status reporting, never for exclusion.
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permit_is_exclusive() {
        let gate = SyncGate::new();
        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.is_held());

        // A second acquisition fails while the permit lives.
        assert!(gate.try_acquire().is_none());
    }

    #[tokio::test]
    async fn test_permit_releases_on_drop() {
        let gate = SyncGate::new();
        let permit = gate.try_acquire().unwrap();
        drop(permit);

        assert!(!gate.is_held());
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_clones_share_one_permit() {
        let gate = SyncGate::new();
        let clone = gate.clone();

        let _permit = gate.try_acquire().unwrap();
        assert!(clone.try_acquire().is_none());
        assert!(clone.is_held());
    }
}
