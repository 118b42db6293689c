//! Declared schema objects and their creation/removal.
//!
//! Tables are listed in dependency order; creation walks the list forwards and
//! removal walks it backwards. Both run inside one transaction.

use tracing::{info, instrument};

use crate::database::Database;
use crate::error::{Result, map_query_err};

/// A table owned by the application along with the statements that create it.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    /// Table name.
    pub name: &'static str,
    /// Idempotent DDL statements, executed in order.
    pub create: &'static [&'static str],
}

const ROLES_TABLE: TableDef = TableDef {
    name: "roles",
    create: &[
        r"CREATE TABLE IF NOT EXISTS roles (
            id SERIAL PRIMARY KEY,
            name VARCHAR(64) NOT NULL,
            is_default BOOLEAN NOT NULL DEFAULT FALSE,
            permissions INTEGER NOT NULL DEFAULT 0,
            CONSTRAINT roles_name_key UNIQUE (name)
        )",
        r"CREATE INDEX IF NOT EXISTS roles_is_default_idx ON roles (is_default)",
    ],
};

const USERS_TABLE: TableDef = TableDef {
    name: "users",
    create: &[
        r"CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            email VARCHAR(64) NOT NULL,
            username VARCHAR(64) NOT NULL,
            password_hash VARCHAR(256) NOT NULL,
            confirmed BOOLEAN NOT NULL DEFAULT FALSE,
            role_id INTEGER REFERENCES roles (id),
            member_since TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT users_email_key UNIQUE (email),
            CONSTRAINT users_username_key UNIQUE (username)
        )",
    ],
};

/// Tables owned by the application, in dependency order.
pub const DECLARED_TABLES: &[TableDef] = &[ROLES_TABLE, USERS_TABLE];

const EXISTING_TABLES_QUERY: &str = r"
    SELECT table_name::TEXT
    FROM information_schema.tables
    WHERE table_schema = current_schema()
      AND table_name::TEXT = ANY($1)
";

impl Database {
    /// Create every declared table that does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    #[instrument(name = "schema.create_all", skip(self))]
    pub async fn create_all(&self) -> Result<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(map_query_err("schema.create_all.begin"))?;
        for table in DECLARED_TABLES {
            for statement in table.create {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_query_err("schema.create_all"))?;
            }
        }
        tx.commit()
            .await
            .map_err(map_query_err("schema.create_all.commit"))?;
        info!(tables = DECLARED_TABLES.len(), "declared tables ensured");
        Ok(())
    }

    /// Drop every declared table, dependants first.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    #[instrument(name = "schema.drop_all", skip(self))]
    pub async fn drop_all(&self) -> Result<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(map_query_err("schema.drop_all.begin"))?;
        for table in DECLARED_TABLES.iter().rev() {
            sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table.name))
                .execute(&mut *tx)
                .await
                .map_err(map_query_err("schema.drop_all"))?;
        }
        tx.commit()
            .await
            .map_err(map_query_err("schema.drop_all.commit"))?;
        info!(tables = DECLARED_TABLES.len(), "declared tables dropped");
        Ok(())
    }

    /// Names of declared tables currently present, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    pub async fn existing_tables(&self) -> Result<Vec<&'static str>> {
        let names: Vec<&'static str> = DECLARED_TABLES.iter().map(|table| table.name).collect();
        let present: Vec<String> = sqlx::query_scalar(EXISTING_TABLES_QUERY)
            .bind(names.as_slice())
            .fetch_all(self.pool())
            .await
            .map_err(map_query_err("schema.existing_tables"))?;
        Ok(names
            .into_iter()
            .filter(|name| present.iter().any(|found| found.as_str() == *name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_tables_are_ordered_by_dependency() {
        let names: Vec<_> = DECLARED_TABLES.iter().map(|table| table.name).collect();
        assert_eq!(names, ["roles", "users"]);
    }

    #[test]
    fn create_statements_are_idempotent() {
        for table in DECLARED_TABLES {
            for statement in table.create {
                assert!(
                    statement.contains("IF NOT EXISTS"),
                    "statement for {} is not idempotent",
                    table.name
                );
            }
        }
    }

    #[test]
    fn users_table_declares_unique_identity_columns() {
        let ddl = USERS_TABLE.create[0];
        assert!(ddl.contains("CONSTRAINT users_email_key UNIQUE (email)"));
        assert!(ddl.contains("CONSTRAINT users_username_key UNIQUE (username)"));
    }
}
