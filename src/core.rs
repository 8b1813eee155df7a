use crate::{
    app::AppContext,
    charges::{ExpirySweeper, SweeperHandle},
    config::Config,
    error::{MockError, Result},
    graphql::GraphqlModule,
    health,
    http::RouteModule,
    rest::{ChargesModule, ConfirmModule},
    store::build_store,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Request id generator for the `x-request-id` header
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

/// The mock service: router, context and background sweeper
pub struct App {
    router: Router<AppContext>,
    config: Config,
    context: AppContext,
}

impl App {
    /// Build the app from configuration, connecting the configured store
    pub fn from_config(config: Config) -> Result<Self> {
        let store = build_store(&config.store)?;
        let context = AppContext::builder()
            .with_config(&config)
            .with_store(store)
            .build();
        Ok(Self::with_context(config, context))
    }

    /// Build the app over an existing context
    pub fn with_context(config: Config, context: AppContext) -> Self {
        Self {
            router: Self::build_router(),
            config,
            context,
        }
    }

    fn build_router() -> Router<AppContext> {
        Router::<AppContext>::new()
            .route("/health", get(health::health_handler))
            .register(ChargesModule)
            .register(ConfirmModule)
            .register(GraphqlModule)
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Get the router for testing purposes
    ///
    /// Middleware is applied and state provided; nothing is spawned.
    pub fn into_test_router(self) -> Router {
        let app = self.with_middleware();
        app.router.with_state(app.context)
    }

    /// Apply middleware stack and prepare for serving
    fn with_middleware(mut self) -> Self {
        let mut router = self.router;

        // outermost last: trace wraps request id wraps body limit
        router = router.layer(DefaultBodyLimit::max(self.config.server.max_body_size));
        router = router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        router = router.layer(TraceLayer::new_for_http());

        self.router = router;
        self
    }

    /// Spawn the expiry sweeper if it is enabled
    fn start_sweeper(&self) -> Option<SweeperHandle> {
        if !self.config.sweeper.enabled {
            tracing::info!("Expiry sweeper disabled");
            return None;
        }
        Some(ExpirySweeper::from_config(self.context.charges.clone(), &self.config.sweeper).spawn())
    }

    /// Start the application server
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.addr().map_err(|e| {
            MockError::internal(format!("Invalid server address in config: {}", e))
        })?;

        let sweeper = self.start_sweeper();
        let app = self.with_middleware();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| MockError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Server starting on http://{}", addr);
        tracing::info!("Health check available at http://{}/health", addr);

        let shutdown = async move {
            shutdown_signal().await;
            if let Some(sweeper) = sweeper {
                sweeper.shutdown().await;
            }
        };

        let router = app.router.with_state(app.context);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| MockError::internal(format!("Server error: {}", e)))
    }
}

/// Merge a [`RouteModule`] into a router, nesting it under its prefix
trait RegisterModule {
    fn register<M: RouteModule>(self, module: M) -> Self;
}

impl RegisterModule for Router<AppContext> {
    fn register<M: RouteModule>(self, module: M) -> Self {
        let routes = module.routes();
        match module.prefix() {
            Some(prefix) => self.nest(prefix, routes),
            None => self.merge(routes),
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give connections a grace period to close
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("Shutdown complete");
}
