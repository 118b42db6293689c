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

//! Environment-driven configuration profiles for Keystone.
//!
//! Layout: `profile.rs` (named profiles and their selector), `model.rs`
//! (`AppConfig` and loading), `error.rs` (error types).

pub mod error;
pub mod model;
pub mod profile;

pub use error::{ConfigError, ConfigResult};
pub use model::{AppConfig, DEFAULT_BIND_ADDR, DEFAULT_MAX_CONNECTIONS};
pub use profile::{CONFIG_SELECTOR_ENV, ConfigProfile};
