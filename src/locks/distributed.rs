//! Distributed, lease-based lock store.
//!
//! Ownership is a key in a shared store created with an atomic
//! set-if-absent-with-expiry. The holder keeps the lease alive with a
//! [`RenewalTask`]; if the holder crashes nobody renews it and the key expires
//! after one lease period, which is what replaces the file store's
//! process-liveness check across hosts.

use super::lease::LeaseClient;
use super::renewal::RenewalTask;
use super::types::{AcquireOutcome, LockStore, ReleaseOutcome};
use crate::error::Result;
use crate::key::LockKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Default lease period.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(2);

/// Lock store coordinating any number of hosts through a shared key/value store.
pub struct DistributedLockStore {
    client: Arc<dyn LeaseClient>,
    lease: Duration,
    prefix: String,
    /// Renewal threads for leases this instance acquired, by store key.
    renewals: Mutex<HashMap<String, RenewalTask>>,
}

impl DistributedLockStore {
    /// Create a store with the given lease period.
    ///
    /// The lease must comfortably exceed one store round trip, since a renewal
    /// is attempted every `lease / 2`.
    pub fn new(client: Arc<dyn LeaseClient>, lease: Duration) -> Self {
        Self {
            client,
            lease,
            prefix: String::new(),
            renewals: Mutex::new(HashMap::new()),
        }
    }

    /// Prepend `prefix` to every store key (namespacing on a shared server).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// The key written to the shared store for `key`.
    pub fn store_key(&self, key: &LockKey) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Whether this instance is still renewing a lease for `key`.
    pub fn is_renewing(&self, key: &LockKey) -> bool {
        self.renewals()
            .get(&self.store_key(key))
            .is_some_and(|task| !task.is_finished())
    }

    /// Stop renewing `key` without deleting it.
    ///
    /// The lease then lapses after at most one lease period, exactly as if this
    /// process had crashed. Returns `false` if no renewal was running.
    pub fn stop_renewal(&self, key: &LockKey) -> bool {
        let task = self.renewals().remove(&self.store_key(key));
        match task {
            Some(task) => {
                task.stop();
                true
            }
            None => false,
        }
    }

    fn renewals(&self) -> MutexGuard<'_, HashMap<String, RenewalTask>> {
        self.renewals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DistributedLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLockStore")
            .field("lease", &self.lease)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl LockStore for DistributedLockStore {
    fn acquire(&self, key: &LockKey) -> Result<AcquireOutcome> {
        let store_key = self.store_key(key);

        if !self.client.set_if_absent(&store_key, self.lease)? {
            debug!(key = %store_key, "lease held elsewhere");
            return Ok(AcquireOutcome::AlreadyHeld);
        }

        let task = match RenewalTask::spawn(self.client.clone(), store_key.clone(), self.lease) {
            Ok(task) => task,
            Err(e) => {
                // Without renewal the lease would lapse under the caller.
                if let Err(cleanup) = self.client.delete(&store_key) {
                    warn!(key = %store_key, error = %cleanup, "failed to delete unrenewable lease");
                }
                return Err(e);
            }
        };

        // A previous renewal for this key can only be a finished one whose
        // lease expired, or we could not have set the key again.
        let previous = self.renewals().insert(store_key.clone(), task);
        if let Some(previous) = previous {
            previous.stop();
        }

        debug!(key = %store_key, lease_ms = self.lease.as_millis() as u64, "lease acquired");
        Ok(AcquireOutcome::Acquired)
    }

    fn release(&self, key: &LockKey) -> Result<ReleaseOutcome> {
        let store_key = self.store_key(key);

        // Join the renewal thread before deleting so no refresh can land after
        // the delete and extend a lease someone else takes next.
        let task = self.renewals().remove(&store_key);
        if let Some(task) = task {
            task.stop();
        }

        if self.client.delete(&store_key)? {
            debug!(key = %store_key, "lease released");
            Ok(ReleaseOutcome::Released)
        } else {
            Ok(ReleaseOutcome::NotOwned)
        }
    }
}

impl Drop for DistributedLockStore {
    fn drop(&mut self) {
        // Leases this instance never released are left to expire.
        let renewals = std::mem::take(
            self.renewals
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (_, task) in renewals {
            task.stop();
        }
    }
}
