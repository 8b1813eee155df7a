use crate::error::{MockError, Result};
use crate::traits::store::{ChargeStore, StoreOp};
use async_trait::async_trait;
use redis::AsyncConnectionConfig;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Redis charge store implementation
///
/// Values are plain strings (`SET`/`GET`), indexes are Redis lists
/// (`RPUSH`/`LREM`/`LRANGE`). Batches run inside `MULTI`/`EXEC`.
#[derive(Clone)]
pub struct RedisChargeStore {
    client: redis::Client,
    timeout: Duration,
    connection: std::sync::Arc<OnceCell<MultiplexedConnection>>,
}

impl RedisChargeStore {
    /// Create a new Redis store from a connection URL
    ///
    /// The connection is opened lazily on first use; `timeout` bounds both
    /// connecting and every individual response.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| MockError::storage(format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            connection: std::sync::Arc::new(OnceCell::new()),
        })
    }

    /// Get a connection from the Redis client
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                self.client
                    .get_multiplexed_async_connection_with_config(
                        &AsyncConnectionConfig::new()
                            .set_connection_timeout(self.timeout)
                            .set_response_timeout(self.timeout),
                    )
                    .await
                    .map_err(|e| {
                        MockError::storage(format!("Failed to get Redis connection: {}", e))
                    })
            })
            .await?;
        Ok(conn.clone())
    }

    /// Ping Redis
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl ChargeStore for RedisChargeStore {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;

        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis GET failed: {}", e)))?;

        Ok(value)
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis SET failed: {}", e)))?;

        Ok(())
    }

    async fn replace_bytes(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let mut conn = self.get_connection().await?;

        // SET ... XX replies nil when the key doesn't exist
        let reply = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("XX")
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis SET XX failed: {}", e)))?;

        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis DEL failed: {}", e)))?;

        Ok(())
    }

    async fn list_append(&self, list: &str, value: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("RPUSH")
            .arg(list)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis RPUSH failed: {}", e)))?;

        Ok(())
    }

    async fn list_remove(&self, list: &str, value: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("LREM")
            .arg(list)
            .arg(0)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis LREM failed: {}", e)))?;

        Ok(())
    }

    async fn list_range(&self, list: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;

        let values = redis::cmd("LRANGE")
            .arg(list)
            .arg(start)
            .arg(stop)
            .query_async::<Vec<String>>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis LRANGE failed: {}", e)))?;

        Ok(values)
    }

    async fn apply(&self, ops: Vec<StoreOp>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut conn = self.get_connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in &ops {
            match op {
                StoreOp::Set { key, value } => {
                    pipe.cmd("SET").arg(key).arg(value.as_slice()).ignore();
                }
                StoreOp::Delete { key } => {
                    pipe.cmd("DEL").arg(key).ignore();
                }
                StoreOp::ListAppend { list, value } => {
                    pipe.cmd("RPUSH").arg(list).arg(value).ignore();
                }
                StoreOp::ListRemove { list, value } => {
                    pipe.cmd("LREM").arg(list).arg(0).arg(value).ignore();
                }
            }
        }

        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| MockError::storage(format!("Redis MULTI/EXEC failed: {}", e)))?;

        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Redis charge store ping failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::store::ChargeStoreExt;

    // These tests require a running Redis instance

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_store_roundtrip() {
        let store = RedisChargeStore::new("redis://127.0.0.1/", Duration::from_secs(2)).unwrap();

        store.set("charge_mock_test_key", &"test_value").await.unwrap();
        let value: String = store.get("charge_mock_test_key").await.unwrap();
        assert_eq!(value, "test_value");

        store.delete("charge_mock_test_key").await.unwrap();
        assert_eq!(store.get_opt::<String>("charge_mock_test_key").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_store_lists_and_batches() {
        let store = RedisChargeStore::new("redis://127.0.0.1/", Duration::from_secs(2)).unwrap();
        let list = "charge_mock_test_list";
        store.delete(list).await.unwrap();

        store
            .apply(vec![
                StoreOp::ListAppend {
                    list: list.to_string(),
                    value: "a".to_string(),
                },
                StoreOp::ListAppend {
                    list: list.to_string(),
                    value: "b".to_string(),
                },
            ])
            .await
            .unwrap();
        assert_eq!(store.list_range(list, 0, -1).await.unwrap(), vec!["a", "b"]);

        store.list_remove(list, "a").await.unwrap();
        assert_eq!(store.list_range(list, 0, -1).await.unwrap(), vec!["b"]);
        store.delete(list).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_replace_requires_existing_key() {
        let store = RedisChargeStore::new("redis://127.0.0.1/", Duration::from_secs(2)).unwrap();
        let key = "charge_mock_test_replace";
        store.delete(key).await.unwrap();

        assert!(!store.replace(key, &"v1").await.unwrap());
        assert_eq!(store.get_opt::<String>(key).await.unwrap(), None);

        store.set(key, &"v1").await.unwrap();
        assert!(store.replace(key, &"v2").await.unwrap());
        assert_eq!(store.get::<String>(key).await.unwrap(), "v2");
        store.delete(key).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_is_storage_error() {
        let store = RedisChargeStore::new("redis://127.0.0.1:1/", Duration::from_millis(500)).unwrap();

        let err = store.get_bytes("key").await.unwrap_err();
        assert!(matches!(err, MockError::Storage(_)));
        assert!(!store.is_healthy().await);
    }

    #[tokio::test]
    async fn test_invalid_url_is_storage_error() {
        let err = RedisChargeStore::new("not-a-url", Duration::from_secs(1)).err();
        assert!(matches!(err, Some(MockError::Storage(_))));
    }
}
