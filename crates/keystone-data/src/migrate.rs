//! Embedded schema migrations.

use sqlx::migrate::Migrator;
use tracing::{info, instrument};

use crate::database::Database;
use crate::error::{DataError, Result, map_query_err};

const MIGRATIONS_TABLE_EXISTS: &str = r"SELECT to_regclass('_sqlx_migrations') IS NOT NULL";
const APPLIED_VERSIONS: &str =
    r"SELECT version FROM _sqlx_migrations WHERE success ORDER BY version";

fn migrator() -> Migrator {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
}

/// Outcome of applying pending migrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions applied by this run, ascending.
    pub applied: Vec<i64>,
    /// Latest version recorded after the run.
    pub current: Option<i64>,
}

/// Versions of every migration embedded in the binary, ascending.
#[must_use]
pub fn known_versions() -> Vec<i64> {
    migrator()
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .map(|migration| migration.version)
        .collect()
}

impl Database {
    /// Apply every pending migration up to the latest embedded revision.
    ///
    /// # Errors
    ///
    /// Returns an error when a migration fails; earlier migrations in the same
    /// run stay applied.
    #[instrument(name = "migrate.upgrade", skip(self))]
    pub async fn upgrade(&self) -> Result<MigrationReport> {
        let before = self.applied_versions().await?;
        migrator()
            .run(self.pool())
            .await
            .map_err(|source| DataError::MigrationFailed { source })?;
        let after = self.applied_versions().await?;

        let applied: Vec<i64> = after
            .iter()
            .copied()
            .filter(|version| !before.contains(version))
            .collect();
        info!(applied = applied.len(), "migrations applied");
        Ok(MigrationReport {
            applied,
            current: after.last().copied(),
        })
    }

    /// Versions recorded as successfully applied, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the bookkeeping table cannot be read.
    pub async fn applied_versions(&self) -> Result<Vec<i64>> {
        let exists: bool = sqlx::query_scalar(MIGRATIONS_TABLE_EXISTS)
            .fetch_one(self.pool())
            .await
            .map_err(map_query_err("migrate.table_exists"))?;
        if !exists {
            return Ok(Vec::new());
        }
        sqlx::query_scalar(APPLIED_VERSIONS)
            .fetch_all(self.pool())
            .await
            .map_err(map_query_err("migrate.applied_versions"))
    }
}
