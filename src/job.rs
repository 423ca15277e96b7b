//! Single-instance execution of a named job.
//!
//! [`JobLock`] is the integration point for job runners: derive the key from
//! the job name (plus an optional identifier for parameterized jobs), take the
//! lock, run the job, release. A job whose lock is held elsewhere is skipped,
//! not failed.

use crate::error::{LockError, Result};
use crate::key::LockKey;
use crate::locks::{LockStore, acquire_guard};
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to a job submitted to [`JobLock::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome<T> {
    /// The lock was taken, the job ran, and the lock was released.
    Completed(T),
    /// Another instance holds the lock; the job did not run.
    Skipped,
}

impl<T> JobOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, JobOutcome::Skipped)
    }
}

/// Runs jobs under a lock from the configured store.
#[derive(Clone)]
pub struct JobLock {
    store: Arc<dyn LockStore>,
    identifier: Option<String>,
}

impl JobLock {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self {
            store,
            identifier: None,
        }
    }

    /// Distinguish parallel-safe variants of one job (per tenant, per shard).
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn store(&self) -> &Arc<dyn LockStore> {
        &self.store
    }

    /// The lock key this runner uses for `name`.
    pub fn key_for(&self, name: &str) -> Result<LockKey> {
        LockKey::new(name, self.identifier.as_deref())
    }

    /// Run `job` if no other instance of `name` is running.
    ///
    /// The lock is released after `job` returns, whatever it returned, and
    /// also when `job` panics. A release failure is reported as
    /// `LockError::Release`, since a lock that cannot be removed blocks every
    /// later run.
    pub fn run<T>(&self, name: &str, job: impl FnOnce() -> T) -> Result<JobOutcome<T>> {
        let key = self.key_for(name)?;

        let Some(guard) = acquire_guard(self.store.as_ref(), &key)? else {
            info!(key = %key, "job already running elsewhere, skipping");
            return Ok(JobOutcome::Skipped);
        };

        let value = job();

        guard.release().map_err(|e| {
            warn!(key = %key, error = %e, "job finished but its lock could not be released");
            LockError::Release {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(JobOutcome::Completed(value))
    }
}

impl std::fmt::Debug for JobLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobLock")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::{
        DistributedLockStore, FileLockStore, KEY_PLACEHOLDER, MemoryLeaseClient, ReleaseOutcome,
    };
    use std::time::Duration;
    use tempfile::TempDir;

    fn file_runner(temp_dir: &TempDir) -> JobLock {
        JobLock::new(Arc::new(FileLockStore::new(temp_dir.path(), KEY_PLACEHOLDER)))
    }

    #[test]
    fn runs_job_and_releases_lock() {
        let temp_dir = TempDir::new().unwrap();
        let runner = file_runner(&temp_dir);

        let outcome = runner.run("send digest", || 7).unwrap();

        assert_eq!(outcome, JobOutcome::Completed(7));
        assert!(!temp_dir.path().join("send-digest").exists());
    }

    #[test]
    fn skips_job_when_lock_is_held() {
        let temp_dir = TempDir::new().unwrap();
        let runner = file_runner(&temp_dir);
        let key = runner.key_for("send digest").unwrap();
        runner.store().acquire(&key).unwrap();

        let mut ran = false;
        let outcome = runner.run("send digest", || ran = true).unwrap();

        assert!(outcome.is_skipped());
        assert!(!ran);
        // The foreign lock is untouched.
        assert!(temp_dir.path().join("send-digest").exists());
    }

    #[test]
    fn lock_is_held_while_job_runs() {
        let temp_dir = TempDir::new().unwrap();
        let runner = file_runner(&temp_dir);

        let nested = runner
            .run("rebuild", || runner.run("rebuild", || ()).unwrap())
            .unwrap();

        assert_eq!(nested, JobOutcome::Completed(JobOutcome::Skipped));
    }

    #[test]
    fn identifier_scopes_the_key() {
        let temp_dir = TempDir::new().unwrap();
        let runner = file_runner(&temp_dir).with_identifier("tenant 9");

        assert_eq!(runner.key_for("import").unwrap().as_str(), "import-tenant-9");

        let other = file_runner(&temp_dir).with_identifier("tenant 10");
        let outcome = runner
            .run("import", || other.run("import", || "inner").unwrap())
            .unwrap();
        assert_eq!(outcome, JobOutcome::Completed(JobOutcome::Completed("inner")));
    }

    #[test]
    fn empty_name_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let runner = file_runner(&temp_dir);

        assert!(matches!(runner.run("", || ()), Err(LockError::InvalidName)));
    }

    #[test]
    fn release_failure_is_reported() {
        let backend = Arc::new(MemoryLeaseClient::new());
        let store = Arc::new(DistributedLockStore::new(
            backend.clone(),
            Duration::from_secs(5),
        ));
        let runner = JobLock::new(store);

        let result = runner.run("flaky", || backend.set_offline(true));

        assert!(matches!(result, Err(LockError::Release { .. })));
    }

    #[test]
    fn panicking_job_releases_its_lease() {
        let backend = Arc::new(MemoryLeaseClient::new());
        let store = Arc::new(DistributedLockStore::new(
            backend.clone(),
            Duration::from_millis(200),
        ));
        let runner = JobLock::new(store.clone());
        let key = runner.key_for("etl").unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            runner.run::<()>("etl", || panic!("job failed"))
        }));
        assert!(result.is_err());

        assert!(!store.is_renewing(&key));
        assert!(!backend.is_live("etl"));
        assert_eq!(runner.run("etl", || 1).unwrap(), JobOutcome::Completed(1));
    }

    #[test]
    fn panicking_job_releases_file_lock() {
        let temp_dir = TempDir::new().unwrap();
        let runner = file_runner(&temp_dir);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            runner.run::<()>("etl", || panic!("job failed"))
        }));

        assert!(result.is_err());
        assert!(!temp_dir.path().join("etl").exists());
    }

    #[test]
    fn works_with_distributed_store() {
        let backend = Arc::new(MemoryLeaseClient::new());
        let store = Arc::new(DistributedLockStore::new(
            backend.clone(),
            Duration::from_secs(5),
        ));
        let runner = JobLock::new(store.clone());

        let outcome = runner.run("digest", || backend.is_live("digest")).unwrap();

        assert_eq!(outcome, JobOutcome::Completed(true));
        assert_eq!(
            store.release(&runner.key_for("digest").unwrap()).unwrap(),
            ReleaseOutcome::NotOwned
        );
    }
}
