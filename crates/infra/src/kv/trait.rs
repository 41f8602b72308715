use std::sync::Arc;

use thiserror::Error;

use stockroom_core::DomainError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key '{0}' (use letters, digits, '-' or '_')")]
    InvalidKey(String),

    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot (de)serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("ledger rejected snapshot: {0}")]
    Domain(#[from] DomainError),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Key/value store for serialized snapshots.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, or `None` if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`; removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Keys double as file names, so keep them to a safe alphabet.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_keys() {
        assert!(validate_key("inventory").is_ok());
        assert!(validate_key("inventory_v2-backup").is_ok());
    }

    #[test]
    fn rejects_path_like_keys() {
        for key in ["", "../etc", "a/b", "inventory.json", "with space"] {
            assert!(matches!(validate_key(key), Err(StoreError::InvalidKey(_))), "{key}");
        }
    }
}
