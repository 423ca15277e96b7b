//! `joblock list`: show local lock directories and their holders.

use joblock::config::{Backend, Config};
use joblock::error::{LockError, Result};
use joblock::exit_codes;

pub fn cmd_list(config: &Config) -> Result<i32> {
    if config.backend != Backend::File {
        return Err(LockError::Unsupported(format!(
            "listing locks is only supported for the file backend (configured: {})",
            config.backend.as_str()
        )));
    }

    let locks = config.file_store().list()?;
    if locks.is_empty() {
        println!("No locks in {}", config.file.dir.display());
        return Ok(exit_codes::SUCCESS);
    }

    println!("Locks in {}:", config.file.dir.display());
    for lock in &locks {
        println!("  {}", lock);
    }
    Ok(exit_codes::SUCCESS)
}
