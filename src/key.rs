//! Lock key derivation.
//!
//! Every caller goes through [`normalize`], so the file store and the
//! distributed store agree on what "the same job" means. Distinct inputs that
//! normalize to the same string (`"a b"` and `"a-b"`) share one lock.

use crate::error::{LockError, Result};
use std::fmt;

/// Canonical lock key: non-empty and restricted to `[A-Za-z0-9-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    /// Derive a key from a job name and an optional identifier suffix.
    ///
    /// Returns `LockError::InvalidName` if `name` is empty.
    pub fn new(name: &str, identifier: Option<&str>) -> Result<Self> {
        if name.is_empty() {
            return Err(LockError::InvalidName);
        }
        Ok(Self(normalize(name, identifier)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize `name` (plus `-identifier` when given) into a lock key.
///
/// Any character outside `[A-Za-z0-9-]` becomes `-`. Non-ASCII characters are
/// replaced one `-` per character, not per byte.
pub fn normalize(name: &str, identifier: Option<&str>) -> String {
    let full = match identifier {
        Some(id) => format!("{}-{}", name, id),
        None => name.to_string(),
    };

    full.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_disallowed_characters() {
        assert_eq!(normalize("My Job!", None), "My-Job-");
        assert_eq!(normalize("app:cache/clear", None), "app-cache-clear");
    }

    #[test]
    fn appends_identifier_with_hyphen() {
        assert_eq!(normalize("job", Some("42")), "job-42");
        assert_eq!(normalize("import", Some("tenant a")), "import-tenant-a");
    }

    #[test]
    fn normalizing_a_key_is_idempotent() {
        let once = normalize("reports:daily (eu)", Some("v2.1"));
        assert_eq!(normalize(&once, None), once);
    }

    #[test]
    fn non_ascii_is_replaced_per_character() {
        assert_eq!(normalize("café", None), "caf-");
    }

    #[test]
    fn colliding_inputs_share_a_key() {
        assert_eq!(normalize("a b", None), normalize("a-b", None));
    }

    #[test]
    fn lock_key_rejects_empty_name() {
        assert!(matches!(LockKey::new("", None), Err(LockError::InvalidName)));
        assert!(matches!(
            LockKey::new("", Some("7")),
            Err(LockError::InvalidName)
        ));
    }

    #[test]
    fn lock_key_displays_normalized_form() {
        let key = LockKey::new("sync users", Some("eu")).unwrap();
        assert_eq!(key.to_string(), "sync-users-eu");
        assert_eq!(key.as_str(), "sync-users-eu");
    }
}
