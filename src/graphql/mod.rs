//! GraphQL surface: app subscriptions and the current app installation
//!
//! Responses pass through the [`MeteringLayer`], which reports a query cost
//! under `extensions.cost`.

mod handler;
pub mod metering;
mod scalars;
mod schema;
mod types;

pub use handler::graphql_handler;
pub use metering::{MeteringLayer, MeteringService, meter_body, query_cost};
pub use scalars::{Decimal, Url};
pub use schema::{ChargeSchema, MutationRoot, QueryRoot, RequestScope, build_schema};
pub use types::{
    APP_INSTALLATION_ID, AppInstallation, AppSubscription, parse_subscription_gid,
    subscription_gid,
};

use crate::app::AppContext;
use crate::http::RouteModule;
use crate::rest::{ADMIN_PREFIX, STORE_ADMIN_PREFIX};
use axum::{Router, routing::post};

/// GraphQL endpoints, metered
pub struct GraphqlModule;

impl RouteModule for GraphqlModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route(&format!("{}/graphql.json", ADMIN_PREFIX), post(graphql_handler))
            .route(
                &format!("{}/graphql.json", STORE_ADMIN_PREFIX),
                post(graphql_handler),
            )
            .route("/graphql", post(graphql_handler))
            .layer(MeteringLayer)
    }
}
