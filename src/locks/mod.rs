//! Locking engine for joblock.
//!
//! One contract, [`LockStore`], with two interchangeable implementations
//! chosen once at configuration time:
//!
//! - [`FileLockStore`]: a directory per lock on a local filesystem. The holder's
//!   pid is recorded inside it and checked for liveness, so locks left behind
//!   by crashed processes are reclaimed by the next acquirer.
//! - [`DistributedLockStore`]: a key with a time-to-live in a shared key/value
//!   store, refreshed by a background thread while the holder runs. A crashed
//!   holder's lease simply expires.
//!
//! Acquisition never blocks or retries. Contention is an ordinary outcome
//! ([`AcquireOutcome::AlreadyHeld`]); only infrastructure failures are errors.
//!
//! # RAII Guards
//!
//! [`acquire_guard`] wraps a successful acquisition in a [`LockGuard`] that
//! releases the lock when dropped. If release fails during drop, a warning is
//! logged but the program does not crash.

mod distributed;
mod file;
mod guard;
pub mod lease;
mod liveness;
mod renewal;
mod types;


// Re-export public API
pub use distributed::{DEFAULT_LEASE, DistributedLockStore};
pub use file::{DEFAULT_PENDING_GRACE, FileLockStore, KEY_PLACEHOLDER, PID_FILE};
pub use guard::{LockGuard, acquire_guard};
pub use lease::{LeaseClient, MemoryLeaseClient, RedisLeaseClient};
pub use liveness::{HolderLiveness, ProcessGroupLiveness};
pub use types::{AcquireOutcome, LockInfo, LockStore, ReleaseOutcome};
