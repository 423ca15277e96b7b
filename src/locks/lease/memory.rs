//! In-process lease backend.

use super::LeaseClient;
use crate::error::{LockError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A [`LeaseClient`] backed by a map of deadlines.
///
/// Honors the same expiry semantics as a real store, so several
/// `DistributedLockStore`s sharing one instance behave like several hosts
/// sharing one Redis. It can also be switched offline to simulate an
/// unreachable store.
#[derive(Debug, Default)]
pub struct MemoryLeaseClient {
    leases: Mutex<HashMap<String, Instant>>,
    offline: AtomicBool,
}

impl MemoryLeaseClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, every operation fails with `LockError::Store`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Whether `key` currently holds an unexpired lease.
    pub fn is_live(&self, key: &str) -> bool {
        let now = Instant::now();
        self.leases()
            .get(key)
            .is_some_and(|deadline| *deadline > now)
    }

    fn leases(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LockError::Store("memory lease store is offline".to_string()));
        }
        Ok(())
    }
}

impl LeaseClient for MemoryLeaseClient {
    fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.check_online()?;
        let now = Instant::now();
        let mut leases = self.leases();

        if leases.get(key).is_some_and(|deadline| *deadline > now) {
            return Ok(false);
        }
        leases.insert(key.to_string(), now + ttl);
        Ok(true)
    }

    fn refresh(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.check_online()?;
        let now = Instant::now();
        let mut leases = self.leases();

        match leases.get_mut(key) {
            Some(deadline) if *deadline > now => {
                *deadline = now + ttl;
                Ok(true)
            }
            Some(_) => {
                leases.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        self.check_online()?;
        let now = Instant::now();
        Ok(self
            .leases()
            .remove(key)
            .is_some_and(|deadline| deadline > now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const TTL: Duration = Duration::from_millis(50);

    #[test]
    fn set_if_absent_only_succeeds_once() {
        let client = MemoryLeaseClient::new();

        assert!(client.set_if_absent("k", TTL).unwrap());
        assert!(!client.set_if_absent("k", TTL).unwrap());
        assert!(client.set_if_absent("other", TTL).unwrap());
    }

    #[test]
    fn expired_lease_can_be_set_again() {
        let client = MemoryLeaseClient::new();
        client.set_if_absent("k", TTL).unwrap();

        thread::sleep(TTL * 2);

        assert!(!client.is_live("k"));
        assert!(client.set_if_absent("k", TTL).unwrap());
    }

    #[test]
    fn refresh_extends_live_lease_only() {
        let client = MemoryLeaseClient::new();
        assert!(!client.refresh("k", TTL).unwrap());

        client.set_if_absent("k", TTL).unwrap();
        assert!(client.refresh("k", Duration::from_secs(60)).unwrap());

        thread::sleep(TTL * 2);
        assert!(client.is_live("k"));
    }

    #[test]
    fn delete_reports_whether_key_was_live() {
        let client = MemoryLeaseClient::new();
        assert!(!client.delete("k").unwrap());

        client.set_if_absent("k", TTL).unwrap();
        assert!(client.delete("k").unwrap());
        assert!(!client.is_live("k"));
    }

    #[test]
    fn offline_client_fails_every_operation() {
        let client = MemoryLeaseClient::new();
        client.set_offline(true);

        assert!(matches!(client.set_if_absent("k", TTL), Err(LockError::Store(_))));
        assert!(client.refresh("k", TTL).is_err());
        assert!(client.delete("k").is_err());

        client.set_offline(false);
        assert!(client.set_if_absent("k", TTL).unwrap());
    }
}
