//! Holder liveness checks for the local file store.

/// Answers "is the process that wrote this lock still running?".
///
/// Only used to decide whether an existing artifact is stale. It is never an
/// authentication mechanism: a recycled pid looks alive.
pub trait HolderLiveness: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Liveness via a process-group query (`getpgid`).
///
/// A pid whose group cannot be looked up is dead, except for `EPERM`, which
/// means the process exists in another session.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessGroupLiveness;

#[cfg(unix)]
impl HolderLiveness for ProcessGroupLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::unistd::{Pid, getpgid};

        // pid 0 would query our own group.
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }

        match getpgid(Some(Pid::from_raw(raw))) {
            Ok(_) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

#[cfg(not(unix))]
impl HolderLiveness for ProcessGroupLiveness {
    fn is_alive(&self, _pid: u32) -> bool {
        // No process-group query here; never reclaim a lock we cannot prove is dead.
        true
    }
}
