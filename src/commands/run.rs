//! `joblock run`: execute a command under the job's lock.

use super::lock_key;
use crate::cli::RunArgs;
use joblock::config::Config;
use joblock::error::{LockError, Result};
use joblock::job::{JobLock, JobOutcome};
use std::process::{Command, ExitStatus};
use tracing::info;

/// Run the command if the lock is free, and exit with its status.
///
/// The lock is released before returning even if the command could not be
/// started, so a typo in the command line does not wedge the job.
pub fn cmd_run(config: &Config, args: RunArgs) -> Result<i32> {
    let key = lock_key(&args.lock)?;
    let mut runner = JobLock::new(config.build_store()?);
    if let Some(identifier) = &args.lock.identifier {
        runner = runner.with_identifier(identifier.clone());
    }

    match runner.run(&args.lock.name, || run_command(&args.command))? {
        JobOutcome::Completed(status) => status,
        JobOutcome::Skipped => {
            info!(key = %key, "another instance holds the lock, not running");
            Ok(i32::from(args.held_exit_code))
        }
    }
}

fn run_command(command: &[String]) -> Result<i32> {
    let Some((program, rest)) = command.split_first() else {
        return Err(LockError::Config("no command given".to_string()));
    };

    let status = Command::new(program)
        .args(rest)
        .status()
        .map_err(|source| LockError::Spawn {
            command: program.clone(),
            source,
        })?;

    Ok(exit_code(status))
}

/// The command's exit code; `128 + signal` if it was killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
