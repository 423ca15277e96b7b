//! Exit code constants for the joblock CLI.
//!
//! - 0: Success (also the default when the lock is held elsewhere)
//! - 1: User error (bad args, invalid config)
//! - 3: The wrapped command could not be started
//! - 4: Lock infrastructure failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, unsupported operation.
pub const USER_ERROR: i32 = 1;

/// The wrapped command could not be spawned.
pub const SPAWN_FAILURE: i32 = 3;

/// Lock infrastructure failure: filesystem or store errors, corrupt artifacts.
pub const LOCK_FAILURE: i32 = 4;
