//! Query cost metering for GraphQL responses
//!
//! The platform reports a query cost under `extensions.cost` on every
//! GraphQL response. This layer buffers the inner response and adds a fixed
//! cost block to JSON object bodies; everything else passes through untouched.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderValue, header},
    response::Response,
};
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Upper bound on a buffered response body
const MAX_BUFFERED_BODY: usize = 16 * 1024 * 1024;

/// The fixed cost block reported for every query
pub fn query_cost() -> Value {
    json!({
        "requestedQueryCost": 10,
        "actualQueryCost": 10,
        "throttleStatus": {
            "maximumAvailable": 2000.0,
            "currentlyAvailable": 1990,
            "restoreRate": 100.0
        }
    })
}

/// Add `extensions.cost` to a JSON object body
///
/// Returns `None` when the body isn't a JSON object, or when it has a
/// non-object `extensions` member that can't be merged into.
pub fn meter_body(body: &[u8]) -> Option<Vec<u8>> {
    let mut json: Map<String, Value> = serde_json::from_slice(body).ok()?;

    let extensions = json
        .entry("extensions")
        .or_insert_with(|| Value::Object(Map::new()));
    match extensions {
        Value::Object(map) => {
            map.insert("cost".to_string(), query_cost());
        }
        Value::Null => *extensions = json!({ "cost": query_cost() }),
        _ => return None,
    }

    serde_json::to_vec(&json).ok()
}

/// Layer that meters GraphQL responses
#[derive(Debug, Clone, Copy, Default)]
pub struct MeteringLayer;

impl<S> Layer<S> for MeteringLayer {
    type Service = MeteringService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MeteringService { inner }
    }
}

/// Service produced by [`MeteringLayer`]
#[derive(Debug, Clone)]
pub struct MeteringService<S> {
    inner: S,
}

impl<S> Service<Request> for MeteringService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // the clone isn't ready; keep the one that was polled
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(req).await?;
            let (mut parts, body) = response.into_parts();

            let bytes = match axum::body::to_bytes(body, MAX_BUFFERED_BODY).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to buffer GraphQL response, forwarding empty body");
                    return Ok(Response::from_parts(parts, Body::empty()));
                }
            };

            let bytes = match meter_body(&bytes) {
                Some(metered) => {
                    parts
                        .headers
                        .insert(header::CONTENT_LENGTH, HeaderValue::from(metered.len()));
                    Bytes::from(metered)
                }
                None => bytes,
            };

            Ok(Response::from_parts(parts, Body::from(bytes)))
        })
    }
}
