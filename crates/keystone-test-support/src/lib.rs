#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across integration suites.
//! Layout: postgres.rs (disposable databases for storage-backed tests).

pub mod postgres;

pub use crate::postgres::{TEST_DATABASE_URL_ENV, TestDatabase, start_postgres};
