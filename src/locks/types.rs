//! Lock store contract and outcome types.

use crate::error::Result;
use crate::key::LockKey;
use std::path::PathBuf;

/// Result of a successful `acquire` round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller now exclusively holds the lock.
    Acquired,
    /// A live holder already has the lock. Expected, not a failure.
    AlreadyHeld,
}

impl AcquireOutcome {
    pub fn is_acquired(self) -> bool {
        matches!(self, AcquireOutcome::Acquired)
    }
}

/// Result of a successful `release` round trip. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// A lock artifact existed and was removed.
    Released,
    /// Nothing was held under the key (never locked, expired, or already released).
    NotOwned,
}

/// A non-blocking mutual-exclusion primitive keyed by [`LockKey`].
///
/// Implementations never wait or retry: a lock held elsewhere comes back as
/// [`AcquireOutcome::AlreadyHeld`] immediately. `Err` is reserved for
/// infrastructure failures where the locking guarantee may not hold.
pub trait LockStore: Send + Sync {
    /// Try to take exclusive ownership of `key`.
    fn acquire(&self, key: &LockKey) -> Result<AcquireOutcome>;

    /// Relinquish `key`. Releasing a key that is not locked succeeds.
    fn release(&self, key: &LockKey) -> Result<ReleaseOutcome>;
}

/// A lock artifact found on disk by [`FileLockStore::list`](super::FileLockStore::list).
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The artifact directory.
    pub path: PathBuf,

    /// The lock key recovered from the artifact name.
    pub key: String,

    /// Holder pid, if one has been published and is readable.
    pub pid: Option<u32>,

    /// Whether the recorded holder is no longer running, or the artifact has
    /// had no holder for longer than the pending grace period.
    pub is_stale: bool,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "{} (pid: {}", self.key, pid)?,
            None => write!(f, "{} (pid: unknown", self.key)?,
        }
        write!(f, "{})", if self.is_stale { ", STALE" } else { "" })
    }
}
