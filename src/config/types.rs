//! Configuration types and defaults for joblock.

use crate::locks::KEY_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which lock store to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Directory locks on the local filesystem (default, single host).
    #[default]
    File,
    /// Expiring leases in a shared Redis-compatible store (any number of hosts).
    Redis,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::File => "file",
            Backend::Redis => "redis",
        }
    }
}

/// Settings for the local file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Directory holding one lock directory per key (created if absent).
    pub dir: PathBuf,

    /// Lock directory name; `{key}` is replaced with the lock key.
    pub pattern: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            dir: default_lock_dir(),
            pattern: KEY_PLACEHOLDER.to_string(),
        }
    }
}

/// Settings for the distributed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Prepended to every key, to share one server between applications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Lease period. Renewal runs every half period.
    pub lease_seconds: u64,

    /// Connect, read, and write timeout for store commands.
    pub connect_timeout_ms: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            prefix: None,
            lease_seconds: 2,
            connect_timeout_ms: 1000,
        }
    }
}

/// `$TMPDIR/joblock`.
pub fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("joblock")
}

pub fn default_log_level() -> String {
    "info".to_string()
}
