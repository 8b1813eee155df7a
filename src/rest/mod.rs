//! REST surface of the recurring application charge API
//!
//! Every route is served twice: under `/admin/api/{version}` (global scope)
//! and under `/{store}/admin/api/{version}` (scoped to that store).

mod confirm;
mod handlers;

pub use confirm::confirm_charge;
pub use handlers::{create_charge, customize_charge, delete_charge, get_charge, list_charges};

use crate::app::AppContext;
use crate::http::RouteModule;
use axum::{
    Router,
    routing::{get, put},
};

pub const ADMIN_PREFIX: &str = "/admin/api/{version}";
pub const STORE_ADMIN_PREFIX: &str = "/{store}/admin/api/{version}";

/// Charge CRUD routes relative to an admin prefix
fn charge_routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/recurring_application_charges.json",
            get(list_charges).post(create_charge),
        )
        .route(
            "/recurring_application_charges/{id}",
            get(get_charge).delete(delete_charge),
        )
        .route(
            "/recurring_application_charges/{id}/customize.json",
            put(customize_charge),
        )
}

/// REST charge endpoints under both admin prefixes
pub struct ChargesModule;

impl RouteModule for ChargesModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .nest(ADMIN_PREFIX, charge_routes())
            .nest(STORE_ADMIN_PREFIX, charge_routes())
    }
}

/// `GET /confirm/{id}`
pub struct ConfirmModule;

impl RouteModule for ConfirmModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new().route("/confirm/{id}", get(confirm_charge))
    }
}
