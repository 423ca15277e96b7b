//! Configuration model for joblock.
//!
//! This module defines the Config struct that represents `joblock.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for every field, and validation of config values.
//! A Config is turned into a store once, at startup, and injected from there;
//! nothing in the engine reads configuration on its own.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use operations::DEFAULT_CONFIG_FILE;
pub use types::{Backend, FileSettings, RedisSettings};
