use crate::charges::{ChargeService, ChargesConfig};
use crate::config::Config;
use crate::graphql::{ChargeSchema, build_schema};
use crate::store::InMemoryChargeStore;
use crate::traits::store::ChargeStore;
use std::sync::Arc;

/// Application context for dependency injection and shared state
///
/// Handed to every handler as axum state. Cloning is cheap.
#[derive(Clone)]
pub struct AppContext {
    pub charges: ChargeService,
    pub schema: ChargeSchema,
    /// Base URL for confirmation links when a request carries no Host header
    pub public_url: String,
}

impl AppContext {
    /// Context over an existing charge service
    pub fn new(charges: ChargeService) -> Self {
        Self {
            charges,
            schema: build_schema(),
            public_url: crate::config::ServerConfig::default().public_url,
        }
    }

    /// Builder pattern for constructing AppContext
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    /// The store behind the charge service
    pub fn store(&self) -> &Arc<dyn ChargeStore> {
        self.charges.store()
    }
}

/// Builder for AppContext with fluent API
#[must_use = "builder does nothing until you call build()"]
pub struct AppContextBuilder {
    store: Option<Arc<dyn ChargeStore>>,
    charges_config: ChargesConfig,
    key_prefix: String,
    public_url: Option<String>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            charges_config: ChargesConfig::default(),
            key_prefix: String::new(),
            public_url: None,
        }
    }

    /// Take charge defaults, key prefix and public URL from `config`
    pub fn with_config(mut self, config: &Config) -> Self {
        self.charges_config = config.charges.clone();
        self.key_prefix = config.store.key_prefix.clone();
        self.public_url = Some(config.server.public_url.clone());
        self
    }

    /// Set the charge store
    pub fn with_store(mut self, store: Arc<dyn ChargeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_charges_config(mut self, config: ChargesConfig) -> Self {
        self.charges_config = config;
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    /// Build the context; without a store an in-memory one is used
    pub fn build(self) -> AppContext {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryChargeStore::new()));
        let charges =
            ChargeService::new(store, self.charges_config).with_key_prefix(self.key_prefix);

        let mut context = AppContext::new(charges);
        if let Some(url) = self.public_url {
            context.public_url = url;
        }
        context
    }
}

impl Default for AppContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
