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

//! Storage layer for Keystone: declared schema, migrations, roles, and users.
//!
//! Layout: `database.rs` (pool handle), `schema.rs` (create/drop of declared
//! tables), `migrate.rs` (embedded migrations), `roles.rs`, `users.rs`,
//! `password.rs` (argon2 hashing), `console.rs` (shell statements), `error.rs`.

pub mod console;
pub mod database;
pub mod error;
pub mod migrate;
pub mod password;
pub mod roles;
pub mod schema;
pub mod users;

pub use console::{StatementKind, StatementOutcome};
pub use database::Database;
pub use error::{DataError, Result as DataResult};
pub use migrate::MigrationReport;
pub use roles::{ADMINISTRATOR, Permissions, ROLE_SEEDS, Role, RoleSeed};
pub use schema::DECLARED_TABLES;
pub use users::{NewUser, User};
