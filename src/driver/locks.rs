//! Per-collection write locks
//!
//! One lock per collection identifier, created on first reference and kept
//! for the life of the registry. The registry's own mutex only guards the
//! lookup/insert step and is released before the caller touches the disk.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock handle for one collection
pub type CollectionLock = Arc<Mutex<()>>;

/// Arena of collection locks
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, CollectionLock>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for `collection`, creating it on first use.
    ///
    /// Repeated calls with the same identifier return the same handle.
    pub fn acquire(&self, collection: &str) -> CollectionLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(collection) {
            return Arc::clone(lock);
        }
        let lock = CollectionLock::default();
        locks.insert(collection.to_string(), Arc::clone(&lock));
        lock
    }

    /// Number of distinct collections seen so far
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a collection handle.
///
/// The guarded value is `()`, so a writer that panicked cannot leave it in a
/// bad state; poisoning is ignored.
pub fn lock(handle: &CollectionLock) -> MutexGuard<'_, ()> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}
