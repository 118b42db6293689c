//! Connection pool handle shared by the storage operations.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{DataError, Result};

/// Database-backed repository for schema, role, and user operations.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool against `url`, failing when the server is unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ConnectFailed`] when no connection can be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|source| DataError::ConnectFailed { source })?;
        info!(max_connections, "database pool ready");
        Ok(Self { pool })
    }

    /// Build a pool that connects on first use.
    ///
    /// Used where a handle must exist before the server is known to be up,
    /// such as router construction.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ConnectFailed`] when `url` cannot be parsed.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)
            .map_err(|source| DataError::ConnectFailed { source })?;
        Ok(Self { pool })
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query to confirm the server answers.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ConnectFailed`] when the query cannot be executed.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::ConnectFailed { source })?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
