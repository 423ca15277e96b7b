//! RAII lock guard implementation.

use super::types::{AcquireOutcome, LockStore, ReleaseOutcome};
use crate::error::Result;
use crate::key::LockKey;

/// RAII guard for an acquired lock.
///
/// When dropped, the lock is released through the store that granted it.
/// If release fails during drop, a warning is logged but no panic occurs.
pub struct LockGuard<'a> {
    store: &'a dyn LockStore,
    key: LockKey,
    released: bool,
}

impl<'a> LockGuard<'a> {
    pub(super) fn new(store: &'a dyn LockStore, key: LockKey) -> Self {
        Self {
            store,
            key,
            released: false,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Release the lock now and surface any error to the caller.
    pub fn release(mut self) -> Result<ReleaseOutcome> {
        self.released = true;
        self.store.release(&self.key)
    }
}

impl std::fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.store.release(&self.key)
        {
            tracing::warn!(key = %self.key, error = %e, "failed to release lock on drop");
        }
    }
}

/// Acquire `key` and wrap it in a guard.
///
/// Returns `Ok(None)` when the lock is held elsewhere.
pub fn acquire_guard<'a>(store: &'a dyn LockStore, key: &LockKey) -> Result<Option<LockGuard<'a>>> {
    match store.acquire(key)? {
        AcquireOutcome::Acquired => Ok(Some(LockGuard::new(store, key.clone()))),
        AcquireOutcome::AlreadyHeld => Ok(None),
    }
}
