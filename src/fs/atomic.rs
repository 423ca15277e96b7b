//! Atomic filesystem operations.
//!
//! A contender may read the holder's pid file at any moment after the lock
//! directory appears. Writes therefore go to a temporary sibling first, are
//! synced, and then renamed into place: readers see either no file or the
//! complete contents, never a truncated one.
//!
//! Source and destination must be on the same filesystem for the rename to be
//! atomic; the temporary file is always created next to the target.

use crate::error::{LockError, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file.
///
/// On failure the temporary file is removed and the target is left untouched.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let temp_path = generate_temp_path(path)?;

    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LockError::io("failed to move temporary file into place", path, e)
    })?;

    // Persist the directory entry as well as the file contents.
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent()
            && let Ok(dir) = File::open(parent)
        {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

/// Create `dir` and any missing parents.
///
/// Concurrent creators racing on the same path all succeed.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(LockError::io("failed to create lock directory", dir, e)),
    }
}

/// Temporary sibling path: `.{filename}.tmp`.
fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LockError::CorruptArtifact {
            path: target.to_path_buf(),
            reason: "path has no usable file name".to_string(),
        })?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).map_err(|e| LockError::io("failed to create temporary file", path, e))?;

    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            let _ = fs::remove_file(path);
            LockError::io("failed to write temporary file", path, e)
        })
}
