//! Request extractors shared by the REST and GraphQL surfaces

use crate::app::AppContext;
use crate::charges::Origin;
use crate::error::{MockError, Result};
use axum::extract::{FromRequestParts, Path};
use axum::http::{HeaderMap, request::Parts};
use std::collections::HashMap;
use std::convert::Infallible;

/// Header carrying the calling store's access token
pub const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

async fn path_params<S: Send + Sync>(parts: &mut Parts, state: &S) -> HashMap<String, String> {
    Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map(|Path(params)| params)
        .unwrap_or_default()
}

/// The store a request acts for
///
/// Taken from the `{store}` path segment, else the access token header.
/// `None` means the global scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tenant(pub Option<String>);

impl Tenant {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    fn from_parts(params: &HashMap<String, String>, headers: &HeaderMap) -> Self {
        if let Some(store) = params.get("store").filter(|s| !s.is_empty()) {
            return Self(Some(store.clone()));
        }
        let token = headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self(token)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Tenant {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let params = path_params(parts, state).await;
        Ok(Self::from_parts(&params, &parts.headers))
    }
}

/// Scheme and host the request came in on, for confirmation links
///
/// Honors `X-Forwarded-Proto`/`X-Forwarded-Host`, falls back to `Host` and
/// finally to the configured public URL.
#[derive(Debug, Clone)]
pub struct RequestOrigin(pub Origin);

impl RequestOrigin {
    fn from_headers(headers: &HeaderMap, public_url: &str) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let host = header("x-forwarded-host").or_else(|| header("host"));
        match host {
            Some(host) => {
                let scheme = header("x-forwarded-proto").unwrap_or("http");
                Self(Origin::new(scheme, host))
            }
            None => Self(Origin::from_base_url(public_url)),
        }
    }
}

impl FromRequestParts<AppContext> for RequestOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, &state.public_url))
    }
}

/// Numeric charge id from the `{id}` path segment
///
/// The platform's URLs end in `.json` (`/recurring_application_charges/42.json`),
/// so that suffix is stripped first. Anything unparseable is a 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeId(pub i64);

impl ChargeId {
    pub fn parse(segment: &str) -> Result<Self> {
        let raw = segment.strip_suffix(".json").unwrap_or(segment);
        raw.parse::<i64>()
            .map(Self)
            .map_err(|_| MockError::not_found(format!("charge id '{}'", segment)))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ChargeId {
    type Rejection = MockError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let params = path_params(parts, state).await;
        let segment = params
            .get("id")
            .ok_or_else(|| MockError::not_found("charge id"))?;
        Self::parse(segment)
    }
}
