//! Charge store backends.
//!
//! Redis is the production backend (via the `store-redis` feature); the
//! in-memory backend serves tests and single-process runs.

mod config;
mod in_memory;

#[cfg(feature = "store-redis")]
mod redis;

pub use config::{StoreBackend, StoreConfig};
pub use in_memory::InMemoryChargeStore;

#[cfg(feature = "store-redis")]
pub use self::redis::RedisChargeStore;

use crate::error::{MockError, Result};
use crate::traits::store::ChargeStore;
use std::sync::Arc;

/// Construct the store selected by `config`.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn ChargeStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory charge store");
            Ok(Arc::new(InMemoryChargeStore::new()))
        }
        StoreBackend::Redis => {
            #[cfg(feature = "store-redis")]
            {
                let url = config.redis_url().ok_or_else(|| {
                    MockError::internal("Redis store selected but no Redis URL configured")
                })?;
                let store = RedisChargeStore::new(&url, config.timeout())?;
                tracing::info!(addr = %config.redis_display_addr(), "Using Redis charge store");
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "store-redis"))]
            {
                Err(MockError::internal(
                    "Redis store selected but the store-redis feature is not enabled",
                ))
            }
        }
    }
}
