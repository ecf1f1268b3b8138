//! Per-key mutual exclusion for mutating transactions.
//!
//! Two transactions touching the same key run one after the other; unrelated
//! keys proceed in parallel. Multi-key acquisition always locks in ascending
//! key order so concurrent holders cannot deadlock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of async locks indexed by key.
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

/// Held lock on one key; released on drop.
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl<K: Eq + Hash + Ord + Clone> KeyedLocks<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Entries only referenced by the map have no holder and no waiter.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Wait until `key` is free and lock it.
    pub async fn acquire(&self, key: K) -> KeyGuard {
        let slot = self.slot(&key);
        KeyGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Lock every key, in ascending order, skipping duplicates.
    pub async fn acquire_all(&self, keys: impl IntoIterator<Item = K>) -> Vec<KeyGuard> {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(key).await);
        }
        guards
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}
