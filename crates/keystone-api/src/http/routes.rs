//! Declarative route registration.
//!
//! # Design
//! - Every route is registered through [`RouteTable::route`], which records the
//!   rule alongside the handler so the table can be listed without a server.
//! - Registration order is preserved; listing never sorts.
//! - A path may be registered once. Methods for one path share a single
//!   `MethodRouter`.

use axum::Router;
use axum::routing::MethodRouter;

use crate::error::{ApiServerError, ApiServerResult};

/// One registered URL rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    /// Path pattern, for example `/api/v1/users/{username}`.
    pub path: &'static str,
    /// Endpoint name.
    pub endpoint: &'static str,
    /// HTTP methods served, upper case.
    pub methods: &'static [&'static str],
}

/// Router builder that remembers what it registered.
pub struct RouteTable<S> {
    entries: Vec<RouteEntry>,
    router: Router<S>,
}

impl<S> Default for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            router: Router::new(),
        }
    }

    /// Register `handler` for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::DuplicateRoute`] if `path` is already registered.
    pub fn route(
        mut self,
        path: &'static str,
        endpoint: &'static str,
        methods: &'static [&'static str],
        handler: MethodRouter<S>,
    ) -> ApiServerResult<Self> {
        if self.entries.iter().any(|entry| entry.path == path) {
            return Err(ApiServerError::DuplicateRoute { path });
        }
        self.router = self.router.route(path, handler);
        self.entries.push(RouteEntry {
            path,
            endpoint,
            methods,
        });
        Ok(self)
    }

    /// Registered rules in registration order.
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Hand over the assembled router.
    #[must_use]
    pub fn into_router(self) -> Router<S> {
        self.router
    }
}
