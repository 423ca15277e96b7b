//! CLI argument parsing for joblock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// joblock: run a recurring job only if no other instance of it is running.
///
/// Locks live either in a local directory (single host) or in a shared Redis
/// server (many hosts), as selected in joblock.yaml.
#[derive(Parser, Debug)]
#[command(name = "joblock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ./joblock.yaml if it exists, else built-in defaults).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for joblock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding the job's lock.
    ///
    /// If another instance holds the lock, exits with --held-exit-code
    /// without running anything. Otherwise exits with the command's status.
    Run(RunArgs),

    /// Remove a job's lock regardless of who holds it.
    Release(LockArgs),

    /// Print the normalized lock key for a job.
    Key(LockArgs),

    /// List lock directories and their holders (file backend only).
    List,
}

/// Identifies the lock for a job.
#[derive(Args, Debug, Clone)]
pub struct LockArgs {
    /// Logical job name.
    #[arg(long, short)]
    pub name: String,

    /// Optional suffix to lock variants of a job separately.
    #[arg(long, short)]
    pub identifier: Option<String>,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub lock: LockArgs,

    /// Exit code to use when the lock is held elsewhere.
    #[arg(long, default_value_t = 0)]
    pub held_exit_code: u8,

    /// The command to run, after `--`.
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run() {
        let cli = Cli::try_parse_from([
            "joblock", "run", "--name", "backup", "--", "pg_dump", "-Fc", "app",
        ])
        .unwrap();

        if let Command::Run(args) = cli.command {
            assert_eq!(args.lock.name, "backup");
            assert_eq!(args.lock.identifier, None);
            assert_eq!(args.held_exit_code, 0);
            assert_eq!(args.command, ["pg_dump", "-Fc", "app"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_with_options() {
        let cli = Cli::try_parse_from([
            "joblock",
            "run",
            "-n",
            "import",
            "-i",
            "tenant-3",
            "--held-exit-code",
            "75",
            "--config",
            "/etc/joblock.yaml",
            "--",
            "import.sh",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/joblock.yaml")));
        if let Command::Run(args) = cli.command {
            assert_eq!(args.lock.identifier.as_deref(), Some("tenant-3"));
            assert_eq!(args.held_exit_code, 75);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_command() {
        assert!(Cli::try_parse_from(["joblock", "run", "--name", "backup"]).is_err());
    }

    #[test]
    fn parse_release() {
        let cli = Cli::try_parse_from(["joblock", "release", "--name", "backup"]).unwrap();
        assert!(matches!(cli.command, Command::Release(ref args) if args.name == "backup"));
    }

    #[test]
    fn parse_key_requires_name() {
        assert!(Cli::try_parse_from(["joblock", "key"]).is_err());
    }

    #[test]
    fn parse_list_with_global_config() {
        let cli = Cli::try_parse_from(["joblock", "list", "-c", "jobs.yaml"]).unwrap();
        assert!(matches!(cli.command, Command::List));
        assert_eq!(cli.config, Some(PathBuf::from("jobs.yaml")));
    }
}
