//! HTTP building blocks: route table, handlers, middleware, and errors.

pub mod errors;
pub(crate) mod handlers;
pub mod profiler;
pub mod routes;
