use crate::locks::HolderLiveness;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Liveness check with a fixed set of dead pids; every other pid is alive.
#[derive(Debug, Default)]
pub(crate) struct FakeLiveness {
    dead: HashSet<u32>,
}

impl FakeLiveness {
    pub(crate) fn with_dead(pids: &[u32]) -> Self {
        Self {
            dead: pids.iter().copied().collect(),
        }
    }
}

impl HolderLiveness for FakeLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        !self.dead.contains(&pid)
    }
}

/// Pid of a process that has already exited and been reaped.
#[cfg(unix)]
pub(crate) fn exited_pid() -> u32 {
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}
