use crate::utils::{get_env_with_prefix, parse_env_with_prefix};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Charge store backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis (requires the store-redis feature)
    #[default]
    Redis,
    /// In-memory map, lost on restart
    Memory,
}

/// Charge store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StoreBackend,

    /// Full Redis connection URL (takes precedence over the address fields)
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Redis host:port, used when no URL is given
    #[serde(default = "default_redis_addr")]
    pub redis_addr: String,

    /// Redis password, used when no URL is given
    #[serde(default)]
    pub redis_password: Option<String>,

    /// Redis logical database, used when no URL is given
    #[serde(default)]
    pub redis_db: u32,

    /// Prefix prepended to every key (empty by default)
    #[serde(default)]
    pub key_prefix: String,

    /// Connection and response timeout for backend calls (in seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: None,
            redis_addr: default_redis_addr(),
            redis_password: None,
            redis_db: 0,
            key_prefix: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl StoreConfig {
    /// In-memory store configuration, handy for tests
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Self::default()
        }
    }

    /// Load store configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(backend) = get_env_with_prefix("STORE_BACKEND") {
            config.backend = match backend.to_lowercase().as_str() {
                "memory" | "in_memory" | "inmemory" => StoreBackend::Memory,
                "redis" => StoreBackend::Redis,
                other => {
                    tracing::warn!(backend = other, "Unknown store backend, using redis");
                    StoreBackend::Redis
                }
            };
        }

        config.redis_url = get_env_with_prefix("REDIS_URL");
        if let Some(addr) = get_env_with_prefix("REDIS_ADDR") {
            config.redis_addr = addr;
        }
        config.redis_password = get_env_with_prefix("REDIS_PASSWORD");
        if let Some(db) = parse_env_with_prefix("REDIS_DB") {
            config.redis_db = db;
        }
        if let Some(prefix) = get_env_with_prefix("STORE_KEY_PREFIX") {
            config.key_prefix = prefix;
        }
        if let Some(timeout) = parse_env_with_prefix("STORE_TIMEOUT_SECONDS") {
            config.timeout_seconds = timeout;
        }

        config
    }

    /// The Redis URL to connect to
    ///
    /// Uses `redis_url` when set, otherwise assembles one from the address,
    /// password and database fields.
    pub fn redis_url(&self) -> Option<String> {
        if let Some(url) = &self.redis_url {
            return Some(url.clone());
        }
        if self.redis_addr.is_empty() {
            return None;
        }
        let auth = match &self.redis_password {
            Some(password) => format!(":{}@", urlencoding::encode(password)),
            None => String::new(),
        };
        Some(format!("redis://{}{}/{}", auth, self.redis_addr, self.redis_db))
    }

    /// Redis location without credentials, for logs
    pub fn redis_display_addr(&self) -> String {
        match &self.redis_url {
            Some(url) => url
                .rsplit_once('@')
                .map(|(_, host)| host.to_string())
                .unwrap_or_else(|| url.clone()),
            None => format!("{}/{}", self.redis_addr, self.redis_db),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_redis_addr() -> String {
    "localhost:6379".to_string()
}

fn default_timeout_seconds() -> u64 {
    5
}
