//! Background lease renewal.
//!
//! While a process holds a distributed lock, a thread refreshes the lease every
//! half lease period. It never re-checks ownership. If the process dies the
//! thread dies with it and the lease lapses on its own; if a refresh fails the
//! thread stops and the lease is left to expire.

use super::lease::LeaseClient;
use crate::error::{LockError, Result};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{trace, warn};

/// Handle to a running renewal thread. Owned by the store that acquired the lease.
#[derive(Debug)]
pub(crate) struct RenewalTask {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl RenewalTask {
    pub(crate) fn spawn(client: Arc<dyn LeaseClient>, key: String, lease: Duration) -> Result<Self> {
        let (stop, stop_rx) = mpsc::channel();
        let interval = lease / 2;

        let handle = thread::Builder::new()
            .name("joblock-renew".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    }

                    match client.refresh(&key, lease) {
                        Ok(true) => trace!(key = %key, "lease renewed"),
                        Ok(false) => {
                            warn!(key = %key, "lease expired before it could be renewed, stopping renewal");
                            return;
                        }
                        Err(e) => {
                            warn!(key = %key, error = %e, "lease renewal failed, stopping renewal");
                            return;
                        }
                    }
                }
            })
            .map_err(|e| LockError::Store(format!("failed to start lease renewal: {}", e)))?;

        Ok(Self { stop, handle })
    }

    /// Whether the thread has exited (stopped or gave up after a failure).
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the thread and wait for it.
    ///
    /// Once this returns no further refresh can reach the store, so a delete
    /// issued afterwards is final.
    pub(crate) fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("lease renewal thread panicked");
        }
    }
}
