//! joblock: run recurring jobs one instance at a time.
//!
//! A job is identified by a name and an optional identifier, normalized into a
//! [`LockKey`](key::LockKey). The key is locked through a
//! [`LockStore`](locks::LockStore): either a directory on the local
//! filesystem, validated against the holder's process liveness, or an expiring
//! lease in a shared Redis-compatible store that a background thread renews
//! while the job runs.
//!
//! ```no_run
//! use joblock::config::Config;
//! use joblock::job::{JobLock, JobOutcome};
//!
//! let store = Config::load("joblock.yaml")?.build_store()?;
//! match JobLock::new(store).run("nightly-report", || 42)? {
//!     JobOutcome::Completed(value) => println!("done: {value}"),
//!     JobOutcome::Skipped => println!("already running"),
//! }
//! # Ok::<(), joblock::error::LockError>(())
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod job;
pub mod key;
pub mod locks;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_support;
