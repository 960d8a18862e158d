//! Per-DN write locks. Isolation between concurrently executing write
//! operations is provided exclusively by these - the rename path takes the
//! current DN's lock first, then the new DN's, and both are released through
//! RAII guards so every exit path releases exactly once.
//!
//! Acquisition is try-only with a bounded number of immediate retries and no
//! backoff. Locks are not re-entrant; a second acquisition of the same DN on
//! the same worker fails like any other contention.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use crate::dn::Dn;

#[derive(Debug, Default)]
struct LockSlot {
    locked: AtomicBool,
}

#[derive(Debug, Default)]
struct LockTable {
    slots: Mutex<HashMap<Dn, Arc<LockSlot>>>,
}

/// The process wide per-DN lock table.
#[derive(Debug, Clone, Default)]
pub struct LockManager {
    table: Arc<LockTable>,
}

impl LockManager {
    pub fn new() -> Self {
        LockManager::default()
    }

    /// One acquisition attempt. Returns the guard, or `None` when the DN is
    /// write locked elsewhere.
    pub fn try_write(&self, dn: &Dn) -> Option<DnWriteLock> {
        let mut slots = self
            .table
            .slots
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let slot = slots
            .entry(dn.clone())
            .or_insert_with(|| Arc::new(LockSlot::default()))
            .clone();
        if slot
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(DnWriteLock {
                dn: dn.clone(),
                slot,
                table: self.table.clone(),
            })
        } else {
            // Losing the race leaves our clone as a transient reference; the
            // slot is garbage collected when the holder releases.
            None
        }
    }

    /// Attempt acquisition up to `attempts` times without backoff.
    pub fn try_write_retries(&self, dn: &Dn, attempts: usize) -> Option<DnWriteLock> {
        for _ in 0..attempts {
            if let Some(guard) = self.try_write(dn) {
                return Some(guard);
            }
        }
        None
    }
}

/// An exclusive write lock over one DN. Dropping the guard releases it.
#[derive(Debug)]
pub struct DnWriteLock {
    dn: Dn,
    slot: Arc<LockSlot>,
    table: Arc<LockTable>,
}

impl DnWriteLock {
    pub fn dn(&self) -> &Dn {
        &self.dn
    }
}

impl Drop for DnWriteLock {
    fn drop(&mut self) {
        let mut slots = self
            .table
            .slots
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        self.slot.locked.store(false, Ordering::Release);
        // Two references means table plus this guard: nobody is waiting, so
        // the slot can be reclaimed.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.dn);
        }
    }
}

/// The entry-DN and new-DN locks of a rename, bound together so both release
/// on every exit path. Declaration order gives entry-DN release first.
#[derive(Debug)]
pub struct DnLockPair {
    _entry: DnWriteLock,
    _new: DnWriteLock,
}

impl DnLockPair {
    pub fn new(entry: DnWriteLock, new: DnWriteLock) -> Self {
        DnLockPair {
            _entry: entry,
            _new: new,
        }
    }
}
