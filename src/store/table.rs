//! Store implementation
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::error::{KeyvalError, Result};
use crate::wal::ReplayTarget;

/// In-memory key-value map
///
/// Empty keys and empty values are rejected, so nothing with an empty
/// key or value reaches the WAL through the store.
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<String, String>>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a put without applying it
    pub fn check_put(key: &str, value: &str) -> Result<()> {
        Self::check_key(key)?;
        if value.is_empty() {
            return Err(KeyvalError::EmptyValue);
        }
        Ok(())
    }

    /// Validate a key for get or delete
    pub fn check_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(KeyvalError::EmptyKey);
        }
        Ok(())
    }

    /// Insert or overwrite a value (write lock)
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        Self::check_put(key, value)?;

        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Result<String> {
        Self::check_key(key)?;

        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or(KeyvalError::NoSuchKey)
    }

    /// Remove a key (write lock); removing an absent key is not an error
    pub fn delete(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;

        self.data.write().remove(key);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of all entries in key order
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl ReplayTarget for Store {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        Store::put(self, key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        Store::delete(self, key)
    }
}
