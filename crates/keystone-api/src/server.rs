//! Router assembly and serving.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::handlers::{get_user, health, list_roles, list_users};
use crate::http::profiler::{ProfilerConfig, ProfilerLayer};
use crate::http::routes::RouteTable;
use crate::state::ApiState;

/// Every route the application serves, in registration order.
///
/// # Errors
///
/// Returns [`ApiServerError::DuplicateRoute`] if a path is registered twice.
pub fn route_table() -> ApiServerResult<RouteTable<Arc<ApiState>>> {
    RouteTable::new()
        .route("/health", "health", &["GET"], get(health))?
        .route("/api/v1/roles", "list_roles", &["GET"], get(list_roles))?
        .route("/api/v1/users", "list_users", &["GET"], get(list_users))?
        .route(
            "/api/v1/users/{username}",
            "get_user",
            &["GET"],
            get(get_user),
        )
}

/// Axum-powered HTTP server for Keystone.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Assemble the router over `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the route table is inconsistent.
    pub fn new(state: Arc<ApiState>) -> ApiServerResult<Self> {
        Self::build(state, None)
    }

    /// Assemble the router with every request wrapped by the profiler.
    ///
    /// # Errors
    ///
    /// Returns an error if the route table is inconsistent.
    pub fn with_profiler(state: Arc<ApiState>, profiler: ProfilerConfig) -> ApiServerResult<Self> {
        Self::build(state, Some(profiler))
    }

    fn build(state: Arc<ApiState>, profiler: Option<ProfilerConfig>) -> ApiServerResult<Self> {
        let mut router = route_table()?.into_router();
        if let Some(config) = profiler {
            info!(
                length = config.length,
                profile_dir = ?config.profile_dir,
                "request profiling enabled"
            );
            router = router.layer(ProfilerLayer::new(config));
        }
        let layered = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http());
        let router = router.layer(layered).with_state(state);
        Ok(Self { router })
    }

    /// Hand over the assembled router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `addr` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(%addr, "starting api");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_table_lists_every_rule_once() -> ApiServerResult<()> {
        let table = route_table()?;
        let paths: Vec<_> = table.entries().iter().map(|entry| entry.path).collect();
        assert_eq!(
            paths,
            [
                "/health",
                "/api/v1/roles",
                "/api/v1/users",
                "/api/v1/users/{username}"
            ]
        );
        Ok(())
    }
}
