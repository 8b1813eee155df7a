use crate::app::AppContext;
use axum::Router;

/// Trait for composable route modules
///
/// Each HTTP surface of the mock (REST, GraphQL, confirmation page) is a
/// module; the [`App`](crate::App) merges them into one router.
///
/// # Example
///
/// ```ignore
/// struct StatusModule;
///
/// impl RouteModule for StatusModule {
///     fn routes(&self) -> Router<AppContext> {
///         Router::new().route("/status", get(status))
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module
    ///
    /// The router should NOT have state applied; the App provides the
    /// [`AppContext`] when it merges modules.
    fn routes(&self) -> Router<AppContext>
    where
        Self: Sized;

    /// Optional path prefix the module is nested under
    fn prefix(&self) -> Option<&str> {
        None
    }
}
