//! Charge store trait for key-value persistence
//!
//! This trait abstracts the storage backend behind the charge lifecycle,
//! allowing the service to run against Redis in production and an in-memory
//! map in tests.

use crate::error::{MockError, Result};
use async_trait::async_trait;

/// A single primitive write, used to group composite updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Set { key: String, value: Vec<u8> },
    Delete { key: String },
    ListAppend { list: String, value: String },
    ListRemove { list: String, value: String },
}

/// Key/value store with ordered lists for enumeration
///
/// Values are opaque bytes (serialized JSON). Entries never expire on their
/// own; eviction is the sweeper's job.
///
/// Record updates are read-modify-write. [`ChargeStore::replace_bytes`] keeps
/// a deleted record from coming back, but two concurrent updates of the same
/// record still race and the last write wins.
#[async_trait]
pub trait ChargeStore: Send + Sync {
    /// Get the raw value stored under `key`
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Overwrite the value under `key` only if the key exists
    ///
    /// Returns `false` and writes nothing when the key is missing. The default
    /// implementation checks and then writes, so a delete landing in between
    /// is lost; both shipped backends override it with a single atomic step.
    async fn replace_bytes(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        if self.get_bytes(key).await?.is_none() {
            return Ok(false);
        }
        self.set_bytes(key, value).await?;
        Ok(true)
    }

    /// Delete a key (missing keys are not an error)
    async fn delete(&self, key: &str) -> Result<()>;

    /// Append `value` to the end of the list stored at `list`
    async fn list_append(&self, list: &str, value: &str) -> Result<()>;

    /// Remove every occurrence of `value` from the list stored at `list`
    async fn list_remove(&self, list: &str, value: &str) -> Result<()>;

    /// Read list elements between `start` and `stop` (inclusive)
    ///
    /// Negative indices count from the end of the list, so `(0, -1)` returns
    /// the whole list. Missing lists read as empty.
    async fn list_range(&self, list: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Apply a batch of writes
    ///
    /// # Important: Backends SHOULD Override This
    ///
    /// The default implementation applies the operations one by one. A crash
    /// or a concurrent writer between two operations can leave an index entry
    /// without its record or a record without its index entry. Both shipped
    /// backends override this with an atomic implementation.
    async fn apply(&self, ops: Vec<StoreOp>) -> Result<()> {
        for op in ops {
            match op {
                StoreOp::Set { key, value } => self.set_bytes(&key, value).await?,
                StoreOp::Delete { key } => self.delete(&key).await?,
                StoreOp::ListAppend { list, value } => self.list_append(&list, &value).await?,
                StoreOp::ListRemove { list, value } => self.list_remove(&list, &value).await?,
            }
        }
        Ok(())
    }

    /// Check if the store backend is healthy
    async fn is_healthy(&self) -> bool;
}

/// Typed JSON helpers on top of [`ChargeStore`]
pub trait ChargeStoreExt: ChargeStore {
    /// Get and deserialize a value, failing with `NotFound` if the key is missing
    async fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.get_opt(key)
            .await?
            .ok_or_else(|| MockError::not_found(key.to_string()))
    }

    /// Get and deserialize a value, returning `None` if the key is missing
    async fn get_opt<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.get_bytes(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                MockError::storage(format!("Corrupt value at '{}': {}", key, e))
            }),
            None => Ok(None),
        }
    }

    /// Serialize and store a value
    async fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: serde::Serialize + Send + Sync,
    {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| MockError::storage(format!("Failed to serialize: {}", e)))?;
        self.set_bytes(key, bytes).await
    }

    /// Serialize and overwrite an existing value; `false` if the key is gone
    async fn replace<T>(&self, key: &str, value: &T) -> Result<bool>
    where
        T: serde::Serialize + Send + Sync,
    {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| MockError::storage(format!("Failed to serialize: {}", e)))?;
        self.replace_bytes(key, bytes).await
    }
}

impl<T: ChargeStore + ?Sized> ChargeStoreExt for T {}

/// Resolve a Redis-style inclusive `(start, stop)` range against a list length.
///
/// Returns `None` when the range selects nothing.
pub fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}
