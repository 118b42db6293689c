//! Command handlers grouped by concern.

pub(crate) mod database;
pub(crate) mod profile;
pub(crate) mod routes;
pub(crate) mod shell;
pub(crate) mod superuser;
