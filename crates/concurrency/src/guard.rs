//! Per-entity concurrency guard
//!
//! A non-queuing mutual-exclusion table: a second acquisition of a held key
//! fails immediately instead of waiting. Listings use this to disable a row's
//! controls while its own request is outstanding, so the busy flags shown in
//! the UI are read straight from the guard.
//!
//! # Thread Safety
//!
//! The table is a DashMap; `try_acquire` uses the entry API so the
//! check-and-insert is atomic for a key. Different keys never contend beyond
//! their shard.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pitlane_core::EntityKey;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Guard table keyed by `K`
///
/// # Example
///
/// ```
/// use pitlane_concurrency::ConcurrencyGuard;
/// use pitlane_core::{EntityKey, EntityKind};
///
/// let guard = ConcurrencyGuard::new();
/// let key = EntityKey::new(EntityKind::Appointment, "12");
///
/// assert!(guard.try_acquire(key.clone()));
/// assert!(!guard.try_acquire(key.clone())); // fails fast, never waits
/// guard.release(&key);
/// assert!(guard.try_acquire(key));
/// ```
#[derive(Debug)]
pub struct ConcurrencyGuard<K: Eq + Hash + Clone = EntityKey> {
    held: DashMap<K, Instant>,
    acquired: AtomicU64,
    contended: AtomicU64,
}

/// Counters of a guard since creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardStats {
    /// Successful acquisitions
    pub acquired: u64,
    /// Acquisitions rejected because the key was held
    pub contended: u64,
    /// Keys currently held
    pub held: usize,
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> ConcurrencyGuard<K> {
    /// Create an empty guard
    pub fn new() -> Self {
        Self {
            held: DashMap::new(),
            acquired: AtomicU64::new(0),
            contended: AtomicU64::new(0),
        }
    }

    /// Lock `key` if it is free
    ///
    /// Returns `true` and locks when unlocked, `false` when already locked.
    /// Never blocks.
    pub fn try_acquire(&self, key: K) -> bool {
        match self.held.entry(key) {
            Entry::Occupied(entry) => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = ?entry.key(), "guard contended");
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                self.acquired.fetch_add(1, Ordering::Relaxed);
                true
            }
        }
    }

    /// Unlock `key`
    ///
    /// Returns whether the key was held.
    pub fn release(&self, key: &K) -> bool {
        self.held.remove(key).is_some()
    }

    /// Lock `key` and return a permit that unlocks on drop
    ///
    /// Holding the permit across an await point ties the lock to the
    /// future: if the future is dropped, the key is released.
    pub fn try_lock(&self, key: K) -> Option<GuardPermit<'_, K>> {
        if self.try_acquire(key.clone()) {
            Some(GuardPermit {
                guard: self,
                key: Some(key),
            })
        } else {
            None
        }
    }

    /// Check if `key` is locked
    pub fn is_held(&self, key: &K) -> bool {
        self.held.contains_key(key)
    }

    /// How long `key` has been held
    pub fn held_for(&self, key: &K) -> Option<Duration> {
        self.held.get(key).map(|since| since.elapsed())
    }

    /// All locked keys
    pub fn held_keys(&self) -> Vec<K> {
        self.held.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of locked keys
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Check if nothing is locked
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Snapshot of the guard counters
    pub fn stats(&self) -> GuardStats {
        GuardStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            held: self.held.len(),
        }
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> Default for ConcurrencyGuard<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII lock on one guard key
#[derive(Debug)]
pub struct GuardPermit<'a, K: Eq + Hash + Clone + std::fmt::Debug> {
    guard: &'a ConcurrencyGuard<K>,
    key: Option<K>,
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> GuardPermit<'_, K> {
    /// Key this permit holds
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Release now instead of at drop
    pub fn release(mut self) {
        if let Some(key) = self.key.take() {
            self.guard.release(&key);
        }
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> Drop for GuardPermit<'_, K> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.guard.release(&key);
        }
    }
}
