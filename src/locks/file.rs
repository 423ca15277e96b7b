//! Local, filesystem-backed lock store.
//!
//! A lock is a directory at `dir/pattern(key)` holding a `pid` file with the
//! holder's process id. `mkdir` is atomic with respect to concurrent creators,
//! so exactly one contender wins the create; everyone else reads the pid and
//! asks whether that process is still alive.
//!
//! # States
//!
//! - **Free**: no directory. `acquire` creates it and writes our pid.
//! - **HeldByLive**: directory with a live pid. `acquire` reports `AlreadyHeld`.
//! - **HeldByDead**: directory with a dead pid. `acquire` reclaims it and tries
//!   the create exactly once more.
//!
//! A directory without a pid file belongs to a holder that has not finished
//! writing it yet and counts as held. `list` marks it stale once it is older
//! than the pending grace period, since its creator most likely died.

use super::liveness::{HolderLiveness, ProcessGroupLiveness};
use super::types::{AcquireOutcome, LockInfo, LockStore, ReleaseOutcome};
use crate::error::{LockError, Result};
use crate::fs::{atomic_write, ensure_dir};
use crate::key::LockKey;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder replaced by the lock key in the artifact name pattern.
pub const KEY_PLACEHOLDER: &str = "{key}";

/// Name of the file inside the artifact that records the holder's pid.
pub const PID_FILE: &str = "pid";

/// How long a pid-less artifact may exist before `list` reports it stale.
pub const DEFAULT_PENDING_GRACE: Duration = Duration::from_secs(10);

/// What the pid file says about the current holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Pid(u32),
    /// The artifact exists but no pid has been published yet.
    Pending,
}

/// Lock store coordinating processes on one host through a shared directory.
pub struct FileLockStore {
    dir: PathBuf,
    pattern: String,
    liveness: Box<dyn HolderLiveness>,
    pending_grace: Duration,
}

impl FileLockStore {
    /// Create a store rooted at `dir`, naming artifacts with `pattern`.
    ///
    /// `pattern` should contain [`KEY_PLACEHOLDER`]; the directory is created
    /// lazily on the first `acquire`.
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
            liveness: Box::new(ProcessGroupLiveness),
            pending_grace: DEFAULT_PENDING_GRACE,
        }
    }

    /// Replace the liveness check (the default queries the process group).
    pub fn with_liveness(mut self, liveness: impl HolderLiveness + 'static) -> Self {
        self.liveness = Box::new(liveness);
        self
    }

    pub fn with_pending_grace(mut self, grace: Duration) -> Self {
        self.pending_grace = grace;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the lock artifact for `key`.
    pub fn artifact_path(&self, key: &LockKey) -> PathBuf {
        self.dir
            .join(self.pattern.replace(KEY_PLACEHOLDER, key.as_str()))
    }

    /// List every lock artifact under the store directory.
    ///
    /// Entries that do not match the name pattern are skipped, as are
    /// in-flight reclaim tombstones. Unreadable pid files show up with no pid.
    /// An artifact is stale when its pid is dead, or when it has had no pid for
    /// longer than the pending grace period.
    pub fn list(&self) -> Result<Vec<LockInfo>> {
        let mut locks = Vec::new();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(locks),
            Err(e) => return Err(LockError::io("failed to read lock directory", &self.dir, e)),
        };

        for entry in entries {
            let entry =
                entry.map_err(|e| LockError::io("failed to read lock directory", &self.dir, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(|name| self.key_from_name(name))
            else {
                continue;
            };

            let (pid, is_stale) = match read_holder(&path) {
                Ok(Holder::Pid(pid)) => (Some(pid), !self.liveness.is_alive(pid)),
                Ok(Holder::Pending) => (None, self.is_abandoned(&path)),
                Err(_) => (None, false),
            };

            locks.push(LockInfo {
                path,
                key,
                pid,
                is_stale,
            });
        }

        locks.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(locks)
    }

    /// Whether a pid-less artifact has outlived the pending grace period.
    fn is_abandoned(&self, path: &Path) -> bool {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age >= self.pending_grace)
    }

    /// Recover the key from an artifact name, if it matches the pattern.
    fn key_from_name(&self, name: &str) -> Option<String> {
        if name.starts_with('.') {
            return None;
        }
        let (prefix, suffix) = self.pattern.split_once(KEY_PLACEHOLDER)?;
        let key = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
        (!key.is_empty()).then(|| key.to_string())
    }

    fn try_acquire(&self, key: &LockKey, path: &Path, may_reclaim: bool) -> Result<AcquireOutcome> {
        match fs::create_dir(path) {
            Ok(()) => {
                publish_holder(path, atomic_write)?;
                debug!(key = %key, path = %path.display(), "lock acquired");
                return Ok(AcquireOutcome::Acquired);
            }
            // Someone else created it first, or it was already there.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(LockError::io("failed to create lock", path, e)),
        }

        match read_holder(path)? {
            Holder::Pending => {
                debug!(key = %key, "lock is being created by another process");
                Ok(AcquireOutcome::AlreadyHeld)
            }
            Holder::Pid(pid) if self.liveness.is_alive(pid) => {
                debug!(key = %key, pid, "lock held by live process");
                Ok(AcquireOutcome::AlreadyHeld)
            }
            Holder::Pid(pid) if may_reclaim => {
                info!(key = %key, pid, "reclaiming lock left by dead process");
                reclaim(path, pid)?;
                self.try_acquire(key, path, false)
            }
            Holder::Pid(pid) => {
                warn!(key = %key, pid, "stale lock reappeared after reclaim, giving up");
                Ok(AcquireOutcome::AlreadyHeld)
            }
        }
    }
}

impl std::fmt::Debug for FileLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLockStore")
            .field("dir", &self.dir)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl LockStore for FileLockStore {
    fn acquire(&self, key: &LockKey) -> Result<AcquireOutcome> {
        ensure_dir(&self.dir)?;
        let path = self.artifact_path(key);
        self.try_acquire(key, &path, true)
    }

    fn release(&self, key: &LockKey) -> Result<ReleaseOutcome> {
        let path = self.artifact_path(key);
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                debug!(key = %key, "lock released");
                Ok(ReleaseOutcome::Released)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ReleaseOutcome::NotOwned),
            Err(e) => Err(LockError::io("failed to remove lock", path, e)),
        }
    }
}

/// Write our pid into a freshly created artifact with `write`.
///
/// An artifact without a valid pid must never claim ownership, so it is
/// removed if the write fails.
pub(super) fn publish_holder(
    path: &Path,
    write: impl FnOnce(PathBuf, &[u8]) -> Result<()>,
) -> Result<()> {
    let pid = std::process::id().to_string();
    if let Err(e) = write(path.join(PID_FILE), pid.as_bytes()) {
        if let Err(cleanup) = fs::remove_dir_all(path) {
            warn!(path = %path.display(), error = %cleanup, "failed to remove half-created lock");
        }
        return Err(e);
    }
    Ok(())
}

fn read_holder(path: &Path) -> Result<Holder> {
    let pid_path = path.join(PID_FILE);
    let content = match fs::read_to_string(&pid_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Holder::Pending),
        Err(e) => return Err(LockError::io("failed to read lock holder", pid_path, e)),
    };

    content
        .trim()
        .parse::<u32>()
        .map(Holder::Pid)
        .map_err(|_| LockError::CorruptArtifact {
            path: pid_path,
            reason: format!("expected a process id, found {:?}", content.trim()),
        })
}

/// Remove a dead holder's artifact.
///
/// The artifact is renamed to a private tombstone first so that two
/// contenders reclaiming at once cannot both delete it. The tombstone is
/// checked again after the rename, and a lock that changed hands in the
/// meantime is put back.
fn reclaim(path: &Path, dead_pid: u32) -> Result<()> {
    match read_holder(path) {
        Ok(Holder::Pid(pid)) if pid == dead_pid => {}
        // Already reclaimed (and possibly re-taken) by someone else.
        Ok(_) => return Ok(()),
        Err(e) => return Err(e),
    }

    let tombstone = tombstone_path(path);
    let _ = fs::remove_dir_all(&tombstone);

    match fs::rename(path, &tombstone) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(LockError::io("failed to remove stale lock", path, e)),
    }

    discard_tombstone(path, &tombstone, dead_pid)
}

/// Delete a renamed-away artifact if it still belongs to `dead_pid`, otherwise
/// move it back to `path`.
pub(super) fn discard_tombstone(path: &Path, tombstone: &Path, dead_pid: u32) -> Result<()> {
    match read_holder(tombstone) {
        Ok(Holder::Pid(pid)) if pid == dead_pid => {
            return fs::remove_dir_all(tombstone)
                .map_err(|e| LockError::io("failed to remove stale lock", tombstone, e));
        }
        Ok(_) | Err(LockError::CorruptArtifact { .. }) => {}
        Err(e) => return Err(e),
    }

    warn!(path = %path.display(), "lock changed hands during reclaim, restoring it");
    fs::rename(tombstone, path)
        .map_err(|e| LockError::io("failed to restore lock taken during reclaim", path, e))
}

/// `.{name}.stale-{our pid}` next to the artifact.
pub(super) fn tombstone_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.stale-{}", name, std::process::id()))
}
