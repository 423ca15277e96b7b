//! Filesystem helpers for the local lock store.

pub mod atomic;

pub use atomic::{atomic_write, ensure_dir};
