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

//! Telemetry primitives shared across the Keystone workspace.
//!
//! Layout: `init.rs` (subscriber installation and logging config),
//! `profile.rs` (span timing collection for request profiling),
//! `error.rs` (error types).

pub mod error;
pub mod init;
pub mod profile;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use profile::{ProfileEntry, RequestProfile, SpanTimingLayer, with_request_profile};
