//! HTTP plumbing shared by the REST and GraphQL surfaces.
//!
//! Extractors for the tenant, the request origin and charge ids, the
//! platform's response envelopes, and the RouteModule trait.

pub mod extract;
pub mod response;
pub mod routes;

pub use extract::{ACCESS_TOKEN_HEADER, ChargeId, RequestOrigin, Tenant};
pub use response::{
    ChargeEnvelope, ChargeListEnvelope, CreatedResponse, Found, JsonResponse, MessageResponse,
};
pub use routes::RouteModule;
