use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::charges::{ChargesConfig, MAX_SWEEPER_SECONDS, ReconfirmPolicy, SweeperConfig};
use crate::error::MockError;
use crate::store::{StoreBackend, StoreConfig};
use crate::utils::{get_env_with_prefix, parse_env_with_prefix};

/// Main configuration for the mock service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
    #[serde(default)]
    pub charges: ChargesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Base URL for confirmation links when a request carries no Host header
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
            public_url: default_public_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set the maximum request body size in bytes
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    /// Set the fallback base URL used in confirmation links
    ///
    /// ```rust
    /// use charge_mock::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new()
    ///     .with_public_url("https://billing.example.test")
    ///     .with_memory_store()
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.server.public_url, "https://billing.example.test");
    /// ```
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.config.server.public_url = url.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Use the in-memory store backend
    pub fn with_memory_store(mut self) -> Self {
        self.config.store.backend = StoreBackend::Memory;
        self
    }

    pub fn with_sweeper(mut self, sweeper: SweeperConfig) -> Self {
        self.config.sweeper = sweeper;
        self
    }

    pub fn with_sweeper_enabled(mut self, enabled: bool) -> Self {
        self.config.sweeper.enabled = enabled;
        self
    }

    pub fn with_reconfirm_policy(mut self, policy: ReconfirmPolicy) -> Self {
        self.config.charges.reconfirm = policy;
        self
    }

    pub fn with_default_capped_amount(mut self, amount: impl Into<String>) -> Self {
        self.config.charges.default_capped_amount = amount.into();
        self
    }

    /// Load configuration from environment variables with CHARGE_MOCK_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        // CHARGE_MOCK_PORT first, then plain PORT
        if let Some(port) = parse_env_with_prefix("PORT") {
            self.config.server.port = port;
        }
        if let Some(size) = parse_env_with_prefix("MAX_BODY_SIZE") {
            self.config.server.max_body_size = size;
        }
        if let Some(url) = get_env_with_prefix("PUBLIC_URL") {
            self.config.server.public_url = url;
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.store = StoreConfig::from_env();
        self.config.sweeper = SweeperConfig::from_env();
        self.config.charges = ChargesConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unparseable server address, an
    /// unknown log level, a zero port or body size, a zero sweeper interval,
    /// or a Redis backend with no way to reach Redis.
    pub fn build(self) -> crate::error::Result<Config> {
        let config = self.config;

        config.server.addr().map_err(|e| {
            MockError::validation(format!(
                "Invalid server address {}:{} - {}",
                config.server.host, config.server.port, e
            ))
        })?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(MockError::validation(format!(
                "Invalid log level: {}. Must be one of: {}",
                config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if config.server.port == 0 {
            return Err(MockError::validation("Server port must be greater than 0"));
        }

        if config.server.max_body_size == 0 {
            return Err(MockError::validation(
                "Maximum body size must be greater than 0",
            ));
        }

        if config.sweeper.enabled && config.sweeper.interval_seconds == 0 {
            return Err(MockError::validation(
                "Sweeper interval must be greater than 0 when enabled",
            ));
        }

        if config.sweeper.interval_seconds > MAX_SWEEPER_SECONDS
            || config.sweeper.retention_seconds > MAX_SWEEPER_SECONDS
        {
            return Err(MockError::validation(format!(
                "Sweeper interval and retention must not exceed {} seconds",
                MAX_SWEEPER_SECONDS
            )));
        }

        if config.store.backend == StoreBackend::Redis && config.store.redis_url().is_none() {
            return Err(MockError::validation(
                "Redis store backend requires REDIS_URL or REDIS_ADDR",
            ));
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert!(config.sweeper.enabled);
    }

    #[test]
    fn test_builder_setters() {
        let config = ConfigBuilder::new()
            .with_host("127.0.0.1")
            .with_port(3000)
            .with_memory_store()
            .with_sweeper_enabled(false)
            .with_reconfirm_policy(ReconfirmPolicy::Reject)
            .with_default_capped_amount("250")
            .build()
            .unwrap();

        assert_eq!(config.server.addr().unwrap().port(), 3000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(!config.sweeper.enabled);
        assert_eq!(config.charges.reconfirm, ReconfirmPolicy::Reject);
        assert_eq!(config.charges.default_capped_amount, "250");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let err = ConfigBuilder::new().with_log_level("loud").build().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(ConfigBuilder::new().with_host("not a host").build().is_err());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(ConfigBuilder::new().with_port(0).build().is_err());
        assert!(ConfigBuilder::new().with_max_body_size(0).build().is_err());

        let sweeper = SweeperConfig {
            interval_seconds: 0,
            ..SweeperConfig::default()
        };
        assert!(ConfigBuilder::new().with_sweeper(sweeper.clone()).build().is_err());

        // a disabled sweeper doesn't need an interval
        let disabled = SweeperConfig {
            enabled: false,
            ..sweeper
        };
        assert!(ConfigBuilder::new().with_sweeper(disabled).build().is_ok());
    }

    #[test]
    fn test_oversized_sweeper_durations_rejected() {
        let retention = SweeperConfig {
            retention_seconds: u64::MAX,
            ..SweeperConfig::default()
        };
        let err = ConfigBuilder::new().with_sweeper(retention).build().unwrap_err();
        assert!(err.to_string().contains("must not exceed"));

        let interval = SweeperConfig {
            interval_seconds: MAX_SWEEPER_SECONDS + 1,
            ..SweeperConfig::default()
        };
        assert!(ConfigBuilder::new().with_sweeper(interval).build().is_err());

        let at_limit = SweeperConfig {
            interval_seconds: MAX_SWEEPER_SECONDS,
            retention_seconds: MAX_SWEEPER_SECONDS,
            ..SweeperConfig::default()
        };
        assert!(ConfigBuilder::new().with_sweeper(at_limit).build().is_ok());
    }

    #[test]
    fn test_redis_without_address_rejected() {
        let store = StoreConfig {
            redis_addr: String::new(),
            ..StoreConfig::default()
        };
        assert!(ConfigBuilder::new().with_store(store.clone()).build().is_err());

        let memory = StoreConfig {
            backend: StoreBackend::Memory,
            ..store
        };
        assert!(ConfigBuilder::new().with_store(memory).build().is_ok());
    }
}
