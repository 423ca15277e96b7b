//! Key/value primitives behind the distributed lock store.
//!
//! The store only needs three operations with the usual Redis semantics:
//! conditional set with expiry, expiry refresh, and delete. Keeping them behind
//! [`LeaseClient`] lets the same lock logic run against Redis in production and
//! against an in-process map in tests.

mod memory;
mod redis_client;

pub use self::memory::MemoryLeaseClient;
pub use self::redis_client::RedisLeaseClient;

use crate::error::Result;
use std::time::Duration;

/// Value stored under a held lease. Only the key's presence matters.
pub const SENTINEL: &str = "1";

/// Shared store operations used to hold a lease.
///
/// Every method is a single round trip. `Err` means the store could not be
/// reached or rejected the command.
pub trait LeaseClient: Send + Sync {
    /// Set `key` only if it is absent, expiring after `ttl`.
    ///
    /// Returns `true` if this call created the key.
    fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Reset the expiry of `key` to `ttl`.
    ///
    /// Returns `false` if the key no longer exists.
    fn refresh(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Delete `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> Result<bool>;
}

/// Lease durations as whole milliseconds, never zero.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}
