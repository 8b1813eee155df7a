use crate::app::AppContext;
use crate::traits::store::ChargeStore;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check status
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check result for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: Vec<ComponentHealth>,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status_code, Json(self)).into_response()
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>>;
}

/// Checks that the charge store answers
pub struct StoreHealthCheck {
    store: Arc<dyn ChargeStore>,
}

impl StoreHealthCheck {
    pub fn new(store: Arc<dyn ChargeStore>) -> Self {
        Self { store }
    }
}

impl HealthCheck for StoreHealthCheck {
    fn name(&self) -> &str {
        "charge_store"
    }

    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>> {
        Box::pin(async move {
            let (status, message) = if self.store.is_healthy().await {
                (HealthStatus::Healthy, None)
            } else {
                (
                    HealthStatus::Unhealthy,
                    Some("Charge store is unreachable".to_string()),
                )
            };
            ComponentHealth {
                name: self.name().to_string(),
                status,
                message,
            }
        })
    }
}

/// Health check manager that runs all registered checks
#[derive(Default)]
pub struct HealthChecker {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub async fn check_health(&self) -> HealthResponse {
        let mut checks = Vec::with_capacity(self.checks.len());
        let mut overall_status = HealthStatus::Healthy;

        for check in &self.checks {
            let result = check.check().await;
            if result.status == HealthStatus::Unhealthy {
                overall_status = HealthStatus::Unhealthy;
            }
            checks.push(result);
        }

        HealthResponse {
            status: overall_status,
            checks,
        }
    }
}

/// Handler for the health endpoint
pub async fn health_handler(State(ctx): State<AppContext>) -> HealthResponse {
    HealthChecker::new()
        .with_check(Arc::new(StoreHealthCheck::new(ctx.store().clone())))
        .check_health()
        .await
}
