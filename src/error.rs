//! Error types for joblock.
//!
//! Contention is not an error: a lock held elsewhere is reported through
//! [`AcquireOutcome::AlreadyHeld`](crate::locks::AcquireOutcome). Everything in
//! here means the locking guarantee may not hold and must reach the caller.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for joblock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// The job name was empty (caller contract violation).
    #[error("lock name must not be empty")]
    InvalidName,

    /// Configuration could not be read, parsed, or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O failed for a reason other than not-found.
    #[error("{action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A lock artifact exists but its contents cannot be trusted.
    #[error("lock artifact '{}' is corrupt: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    /// The shared key/value store is unreachable or returned an error.
    #[error("lock store error: {0}")]
    Store(String),

    /// The lock was taken and the job ran, but the lock could not be released.
    #[error("failed to release lock '{key}': {reason}")]
    Release { key: String, reason: String },

    /// The wrapped command could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured backend does not support the requested operation.
    #[error("{0}")]
    Unsupported(String),
}

impl LockError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        LockError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::InvalidName | LockError::Config(_) | LockError::Unsupported(_) => {
                exit_codes::USER_ERROR
            }
            LockError::Spawn { .. } => exit_codes::SPAWN_FAILURE,
            LockError::Io { .. }
            | LockError::CorruptArtifact { .. }
            | LockError::Store(_)
            | LockError::Release { .. } => exit_codes::LOCK_FAILURE,
        }
    }
}

impl From<redis::RedisError> for LockError {
    fn from(err: redis::RedisError) -> Self {
        LockError::Store(err.to_string())
    }
}

/// Result type alias for joblock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn invalid_name_is_a_user_error() {
        assert_eq!(LockError::InvalidName.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn infrastructure_errors_map_to_lock_failure() {
        let err = LockError::io(
            "failed to create lock",
            "/tmp/x",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
        assert_eq!(
            LockError::Store("connection refused".to_string()).exit_code(),
            exit_codes::LOCK_FAILURE
        );
    }

    #[test]
    fn spawn_error_has_its_own_exit_code() {
        let err = LockError::Spawn {
            command: "backup".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), exit_codes::SPAWN_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = LockError::CorruptArtifact {
            path: PathBuf::from("/var/lock/job/pid"),
            reason: "not a process id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "lock artifact '/var/lock/job/pid' is corrupt: not a process id"
        );

        let err = LockError::Release {
            key: "nightly".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to release lock 'nightly': permission denied"
        );
    }
}
