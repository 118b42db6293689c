//! Error types for the data access layer.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the data access layer.
#[derive(Debug)]
pub enum DataError {
    /// The database could not be reached.
    ConnectFailed {
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// Migration execution failed.
    MigrationFailed {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
    /// A database operation failed.
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// A write violated a uniqueness constraint.
    Conflict {
        /// Name of the violated constraint.
        constraint: String,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// A role required by the operation does not exist.
    RoleMissing {
        /// Name of the role that was looked up.
        name: String,
    },
    /// Password hashing or verification failed.
    PasswordHash {
        /// Hashing error detail.
        detail: password_hash::Error,
    },
}

impl DataError {
    /// Whether the error is a uniqueness violation.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { .. } => formatter.write_str("database unreachable"),
            Self::MigrationFailed { .. } => formatter.write_str("migration failed"),
            Self::QueryFailed { .. } => formatter.write_str("database operation failed"),
            Self::Conflict { constraint, .. } => {
                write!(formatter, "uniqueness constraint `{constraint}` violated")
            }
            Self::RoleMissing { name } => write!(formatter, "role `{name}` does not exist"),
            Self::PasswordHash { .. } => formatter.write_str("password hashing failed"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConnectFailed { source }
            | Self::Conflict { source, .. }
            | Self::QueryFailed { source, .. } => Some(sql_source(source)),
            Self::MigrationFailed { source } => Some(source),
            Self::RoleMissing { .. } | Self::PasswordHash { .. } => None,
        }
    }
}

/// Server-reported errors are exposed directly; `sqlx::Error::Database`
/// already repeats the server message in its own `Display`.
fn sql_source(source: &sqlx::Error) -> &(dyn Error + 'static) {
    match source {
        sqlx::Error::Database(db) => db.as_error(),
        other => other,
    }
}

/// Map a raw SQL error for `operation`, recognising uniqueness violations.
pub(crate) fn map_write_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| {
        let constraint = match &source {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Some(db.constraint().unwrap_or("unique").to_string())
            }
            _ => None,
        };
        match constraint {
            Some(constraint) => DataError::Conflict { constraint, source },
            None => DataError::QueryFailed { operation, source },
        }
    }
}

pub(crate) fn map_query_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}
