//! Testing utilities for the charge mock
//!
//! - [`test_app`] builds the full router over an in-memory store
//! - [`Scenario`]/[`ScenarioAssert`] drive it in-process with fluent assertions
//!
//! # Example
//!
//! ```rust,ignore
//! use charge_mock::testing;
//!
//! #[tokio::test]
//! async fn health_is_ok() {
//!     testing::get(testing::test_app(), "/health")
//!         .execute()
//!         .await
//!         .assert_ok()
//!         .assert_json();
//! }
//! ```

mod scenario;

pub use scenario::{Scenario, ScenarioAssert, delete, get, graphql, post, put};

use crate::app::AppContext;
use crate::charges::ChargesConfig;
use crate::config::Config;
use crate::core::App;
use crate::store::InMemoryChargeStore;
use axum::Router;
use std::sync::Arc;

/// The full router over a fresh in-memory store, with default settings
pub fn test_app() -> Router {
    test_app_with_context(test_context(ChargesConfig::default()))
}

/// A context over a fresh in-memory store
pub fn test_context(charges: ChargesConfig) -> AppContext {
    AppContext::builder()
        .with_store(Arc::new(InMemoryChargeStore::new()))
        .with_charges_config(charges)
        .build()
}

/// The full router over an existing context
///
/// Keep a clone of the context to inspect or seed the store directly.
pub fn test_app_with_context(context: AppContext) -> Router {
    App::with_context(Config::default(), context).into_test_router()
}
