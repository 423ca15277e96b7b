//! Command implementations for joblock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command returns the process exit code on success.

mod list;
mod release;
mod run;

use crate::cli::{Cli, Command, LockArgs};
use joblock::config::Config;
use joblock::error::Result;
use joblock::exit_codes;
use joblock::key::LockKey;
use joblock::logging::init_logging;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<i32> {
    // Deriving a key needs no configuration.
    if let Command::Key(args) = &cli.command {
        return cmd_key(args);
    }

    let config = Config::resolve(cli.config.as_deref())?;
    init_logging(&config.log_level);

    match cli.command {
        Command::Run(args) => run::cmd_run(&config, args),
        Command::Release(args) => release::cmd_release(&config, &args),
        Command::List => list::cmd_list(&config),
        Command::Key(args) => cmd_key(&args),
    }
}

fn lock_key(args: &LockArgs) -> Result<LockKey> {
    LockKey::new(&args.name, args.identifier.as_deref())
}

fn cmd_key(args: &LockArgs) -> Result<i32> {
    println!("{}", lock_key(args)?);
    Ok(exit_codes::SUCCESS)
}
