//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for joblock.
///
/// This struct represents the contents of `joblock.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lock store to use.
    pub backend: Backend,

    /// Used when `backend` is `file`.
    pub file: FileSettings,

    /// Used when `backend` is `redis`.
    pub redis: RedisSettings,

    /// Default log filter; `JOBLOCK_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            file: FileSettings::default(),
            redis: RedisSettings::default(),
            log_level: default_log_level(),
        }
    }
}
