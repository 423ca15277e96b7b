//! `joblock release`: force-remove a job's lock.

use super::lock_key;
use crate::cli::LockArgs;
use joblock::config::Config;
use joblock::error::Result;
use joblock::exit_codes;
use joblock::locks::ReleaseOutcome;

pub fn cmd_release(config: &Config, args: &LockArgs) -> Result<i32> {
    let key = lock_key(args)?;
    let store = config.build_store()?;

    match store.release(&key)? {
        ReleaseOutcome::Released => println!("Released lock '{}'", key),
        ReleaseOutcome::NotOwned => println!("Lock '{}' was not held", key),
    }
    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use joblock::key::LockKey;
    use joblock::locks::LockStore;
    use tempfile::TempDir;

    #[test]
    fn removes_existing_lock() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.file.dir = temp_dir.path().to_path_buf();
        config
            .file_store()
            .acquire(&LockKey::new("sync", Some("eu")).unwrap())
            .unwrap();

        let args = LockArgs {
            name: "sync".to_string(),
            identifier: Some("eu".to_string()),
        };
        assert_eq!(cmd_release(&config, &args).unwrap(), exit_codes::SUCCESS);
        assert!(!temp_dir.path().join("sync-eu").exists());

        // Releasing again is still success.
        assert_eq!(cmd_release(&config, &args).unwrap(), exit_codes::SUCCESS);
    }
}
