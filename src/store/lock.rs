//! Per-key async mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OwnedMutexGuard;

type Slots = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Async lock keyed by string.
///
/// A slot exists only while some caller holds or waits on it.
#[derive(Debug, Default)]
pub struct KeyedLock {
    slots: Mutex<Slots>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Cancelling the wait releases the slot like dropping the guard would.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let slot = self.slots().entry(key.to_string()).or_default().clone();
        let release = Release {
            owner: self,
            key: key.to_string(),
        };
        let guard = slot.lock_owned().await;
        KeyedGuard {
            _guard: guard,
            _release: release,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyedGuard<'a> {
    // Declaration order is drop order: unlock before releasing the slot.
    _guard: OwnedMutexGuard<()>,
    _release: Release<'a>,
}

/// Removes the slot of `key` once nobody holds or waits on it.
struct Release<'a> {
    owner: &'a KeyedLock,
    key: String,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        let mut slots = self.owner.slots();
        // Only the map's own reference left: no holder, no waiter.
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}
