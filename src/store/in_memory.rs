//! In-memory charge store
//!
//! Keeps values and lists in plain maps behind a single `RwLock`, which makes
//! batches trivially atomic. Suitable for tests and single-instance runs.

use crate::error::Result;
use crate::traits::store::{ChargeStore, StoreOp, resolve_range};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    values: HashMap<String, Vec<u8>>,
    lists: HashMap<String, Vec<String>>,
}

impl Inner {
    fn apply_op(&mut self, op: StoreOp) {
        match op {
            StoreOp::Set { key, value } => {
                self.values.insert(key, value);
            }
            StoreOp::Delete { key } => {
                self.values.remove(&key);
                self.lists.remove(&key);
            }
            StoreOp::ListAppend { list, value } => {
                self.lists.entry(list).or_default().push(value);
            }
            StoreOp::ListRemove { list, value } => {
                if let Some(items) = self.lists.get_mut(&list) {
                    items.retain(|item| item != &value);
                    if items.is_empty() {
                        self.lists.remove(&list);
                    }
                }
            }
        }
    }
}

/// In-memory implementation of [`ChargeStore`]
///
/// Cloning is cheap and clones share the same data.
///
/// # Example
///
/// ```rust,ignore
/// use charge_mock::store::InMemoryChargeStore;
/// use charge_mock::traits::store::ChargeStoreExt;
///
/// let store = InMemoryChargeStore::new();
/// store.set("recurring_application_charge:1", &charge).await?;
/// store.list_append("recurring_application_charges_ids", "recurring_application_charge:1").await?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryChargeStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryChargeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of plain values currently stored
    pub async fn len(&self) -> usize {
        self.inner.read().await.values.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ChargeStore for InMemoryChargeStore {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read().await.values.get(key).cloned())
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.inner.write().await.apply_op(StoreOp::Set {
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    async fn replace_bytes(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.values.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.write().await.apply_op(StoreOp::Delete {
            key: key.to_string(),
        });
        Ok(())
    }

    async fn list_append(&self, list: &str, value: &str) -> Result<()> {
        self.inner.write().await.apply_op(StoreOp::ListAppend {
            list: list.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn list_remove(&self, list: &str, value: &str) -> Result<()> {
        self.inner.write().await.apply_op(StoreOp::ListRemove {
            list: list.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn list_range(&self, list: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let Some(items) = inner.lists.get(list) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(items.len(), start, stop) {
            Some((from, to)) => items[from..=to].to_vec(),
            None => Vec::new(),
        })
    }

    async fn apply(&self, ops: Vec<StoreOp>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for op in ops {
            inner.apply_op(op);
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MockError;
    use crate::traits::store::ChargeStoreExt;

    #[tokio::test]
    async fn test_get_set() {
        let store = InMemoryChargeStore::new();
        store.set("key1", &"value1").await.unwrap();

        let value: String = store.get("key1").await.unwrap();
        assert_eq!(value, "value1");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryChargeStore::new();
        let err = store.get::<String>("missing").await.unwrap_err();
        assert!(matches!(err, MockError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_value_is_storage_error() {
        let store = InMemoryChargeStore::new();
        store.set_bytes("key1", b"not json".to_vec()).await.unwrap();
        let err = store.get::<String>("key1").await.unwrap_err();
        assert!(matches!(err, MockError::Storage(_)));
    }

    #[tokio::test]
    async fn test_replace_only_existing_keys() {
        let store = InMemoryChargeStore::new();
        assert!(!store.replace("key1", &"value1").await.unwrap());
        assert_eq!(store.get_opt::<String>("key1").await.unwrap(), None);

        store.set("key1", &"value1").await.unwrap();
        assert!(store.replace("key1", &"value2").await.unwrap());
        assert_eq!(store.get::<String>("key1").await.unwrap(), "value2");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryChargeStore::new();
        store.set("key1", &"value1").await.unwrap();
        store.delete("key1").await.unwrap();

        assert_eq!(store.get_opt::<String>("key1").await.unwrap(), None);
        // deleting again is fine
        store.delete("key1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_operations() {
        let store = InMemoryChargeStore::new();
        for value in ["a", "b", "c", "b"] {
            store.list_append("ids", value).await.unwrap();
        }

        assert_eq!(store.list_range("ids", 0, -1).await.unwrap(), vec!["a", "b", "c", "b"]);
        assert_eq!(store.list_range("ids", 1, 2).await.unwrap(), vec!["b", "c"]);

        store.list_remove("ids", "b").await.unwrap();
        assert_eq!(store.list_range("ids", 0, -1).await.unwrap(), vec!["a", "c"]);

        assert!(store.list_range("other", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_batch() {
        let store = InMemoryChargeStore::new();
        store
            .apply(vec![
                StoreOp::Set {
                    key: "charge:1".to_string(),
                    value: b"1".to_vec(),
                },
                StoreOp::ListAppend {
                    list: "ids".to_string(),
                    value: "charge:1".to_string(),
                },
            ])
            .await
            .unwrap();

        assert_eq!(store.get::<u32>("charge:1").await.unwrap(), 1);
        assert_eq!(store.list_range("ids", 0, -1).await.unwrap(), vec!["charge:1"]);

        store
            .apply(vec![
                StoreOp::Delete {
                    key: "charge:1".to_string(),
                },
                StoreOp::ListRemove {
                    list: "ids".to_string(),
                    value: "charge:1".to_string(),
                },
            ])
            .await
            .unwrap();

        assert!(store.is_empty().await);
        assert!(store.list_range("ids", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let store = InMemoryChargeStore::new();
        let mut handles = vec![];

        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..50 {
                    let key = format!("key{}_{}", i, j);
                    store.set(&key, &j).await.unwrap();
                    store.list_append("ids", &key).await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 500);
        assert_eq!(store.list_range("ids", 0, -1).await.unwrap().len(), 500);
    }
}
