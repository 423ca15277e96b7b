//! Config loading, validation, and store construction.

use super::model::Config;
use super::types::Backend;
use crate::error::{LockError, Result};
use crate::locks::{
    DistributedLockStore, FileLockStore, KEY_PLACEHOLDER, LockStore, RedisLeaseClient,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "joblock.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load `explicit` if given, else `joblock.yaml` in the working directory
    /// if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `file.pattern` contains `{key}` exactly once and no path separator
    /// - `redis.lease_seconds` and `redis.connect_timeout_ms` are positive
    /// - `redis.host` is non-empty when the redis backend is selected
    /// - `log_level` is a valid log filter
    pub fn validate(&self) -> Result<()> {
        let pattern = &self.file.pattern;
        if pattern.matches(KEY_PLACEHOLDER).count() != 1 {
            return Err(LockError::Config(format!(
                "file.pattern must contain {} exactly once (found '{}')",
                KEY_PLACEHOLDER, pattern
            )));
        }
        if pattern.contains('/') || pattern.contains('\\') {
            return Err(LockError::Config(format!(
                "file.pattern must be a single path component (found '{}')",
                pattern
            )));
        }

        if self.redis.lease_seconds == 0 {
            return Err(LockError::Config(
                "redis.lease_seconds must be greater than 0".to_string(),
            ));
        }
        if self.redis.connect_timeout_ms == 0 {
            return Err(LockError::Config(
                "redis.connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.backend == Backend::Redis && self.redis.host.trim().is_empty() {
            return Err(LockError::Config(
                "redis.host must be set when backend is redis".to_string(),
            ));
        }

        EnvFilter::try_new(&self.log_level).map_err(|e| {
            LockError::Config(format!("invalid log_level '{}': {}", self.log_level, e))
        })?;

        Ok(())
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.redis.lease_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.redis.connect_timeout_ms)
    }

    /// The file store described by the `file` section.
    pub fn file_store(&self) -> FileLockStore {
        FileLockStore::new(&self.file.dir, self.file.pattern.clone())
    }

    /// The distributed store described by the `redis` section.
    ///
    /// Does not connect; the first acquire or release does.
    pub fn distributed_store(&self) -> Result<DistributedLockStore> {
        let redis = &self.redis;
        let client = RedisLeaseClient::new(
            &redis.host,
            redis.port,
            redis.password.as_deref(),
            self.connect_timeout(),
        )?;

        let store = DistributedLockStore::new(Arc::new(client), self.lease());
        Ok(match &redis.prefix {
            Some(prefix) => store.with_prefix(prefix.clone()),
            None => store,
        })
    }

    /// Build the store selected by `backend`.
    pub fn build_store(&self) -> Result<Arc<dyn LockStore>> {
        let store: Arc<dyn LockStore> = match self.backend {
            Backend::File => Arc::new(self.file_store()),
            Backend::Redis => Arc::new(self.distributed_store()?),
        };
        Ok(store)
    }
}
