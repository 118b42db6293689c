#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::pedantic, clippy::nursery)]

//! HTTP surface of Keystone.
//!
//! Layout: `http/routes.rs` (declarative route table), `http/handlers.rs`
//! (endpoints), `http/profiler.rs` (request profiling middleware),
//! `http/errors.rs` (problem responses), `server.rs` (router assembly and
//! serving), `state.rs`, `error.rs`.

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::profiler::{
    DEFAULT_PROFILE_LENGTH, PROFILE_RULE, ProfilerConfig, ProfilerLayer, render_report,
};
pub use http::routes::{RouteEntry, RouteTable};
pub use server::{ApiServer, route_table};
pub use state::ApiState;
