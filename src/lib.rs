//! charge-mock - a stand-in for the platform's recurring application charge API
//!
//! Apps under test talk to this service instead of the real billing API.
//! It stores charges in Redis (or memory), exposes the REST and GraphQL
//! endpoints apps call, serves a confirmation page that accepts or declines
//! a charge, and evicts charges after a retention window.
//!
//! # Features
//!
//! - **REST**: `recurring_application_charges` create, list, get, customize, delete
//! - **GraphQL**: `appSubscriptionCreate`, `currentAppInstallation`, `node`,
//!   with query cost reported under `extensions.cost`
//! - **Confirmation**: `GET /confirm/{id}?action=accept|decline`
//! - **Expiry**: background sweeper with configurable interval and retention
//! - **Testing**: HTTP scenario helpers that drive the router in-process
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use charge_mock::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> charge_mock::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     charge_mock::init_tracing_with_config(&config);
//!
//!     App::from_config(config)?.serve().await
//! }
//! ```

#![allow(async_fn_in_trait)] // ChargeStoreExt is only used on concrete or dyn stores

mod app;
pub mod charges;
pub mod config;
mod core;
mod error;
pub mod graphql;
pub mod health;
pub mod http;
pub mod rest;
pub mod store;
pub mod testing;
pub mod traits;
mod utils;

// Re-exports for public API
pub use app::{AppContext, AppContextBuilder};
pub use charges::{
    ChargeService, ChargeStatus, ChargesConfig, ConfirmAction, Confirmation, ExpirySweeper,
    NewCharge, Origin, ReconfirmPolicy, RecurringCharge, SweepReport, SweeperConfig,
    SweeperHandle,
};
pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use self::core::{App, MakeRequestUuid};
pub use error::{MockError, Result};
pub use health::{ComponentHealth, HealthCheck, HealthChecker, HealthStatus, StoreHealthCheck};
pub use http::RouteModule;
pub use store::{InMemoryChargeStore, StoreBackend, StoreConfig, build_store};
#[cfg(feature = "store-redis")]
pub use store::RedisChargeStore;
pub use traits::store::{ChargeStore, ChargeStoreExt, StoreOp};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "charge_mock=debug")
/// - `CHARGE_MOCK_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from the logging section of a [`Config`]
///
/// `RUST_LOG` still wins over the configured level when set.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    install_subscriber(env_filter, config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}
