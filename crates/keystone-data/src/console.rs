//! Ad-hoc statement execution for the interactive shell.

use sqlx::Row;
use tracing::instrument;

use crate::database::Database;
use crate::error::{Result, map_query_err, map_write_err};

/// Leading keywords of statements whose rows can be wrapped in a subquery.
const WRAPPABLE: [&str; 4] = ["SELECT", "WITH", "VALUES", "TABLE"];
/// Leading keywords of utility statements that return rows but cannot be wrapped.
const UTILITY: [&str; 2] = ["SHOW", "EXPLAIN"];

/// How a statement's result is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Rows are rendered as JSON objects.
    Query,
    /// Rows are rendered as their text columns.
    Utility,
    /// Only the affected row count is reported.
    Command,
}

impl StatementKind {
    /// Classify `sql` by its leading keyword.
    #[must_use]
    pub fn classify(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        if WRAPPABLE.contains(&keyword.as_str()) {
            Self::Query
        } else if UTILITY.contains(&keyword.as_str()) {
            Self::Utility
        } else {
            Self::Command
        }
    }
}

/// Result of one shell statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutcome {
    /// One rendered line per returned row.
    Rows(Vec<String>),
    /// Rows affected by a command.
    Affected(u64),
}

impl Database {
    /// Execute one operator-supplied statement.
    ///
    /// # Errors
    ///
    /// Returns an error when the statement fails; nothing is retried.
    #[instrument(name = "console.execute", skip(self, sql))]
    pub async fn execute_statement(&self, sql: &str) -> Result<StatementOutcome> {
        let statement = sql.trim().trim_end_matches(';').trim_end();
        match StatementKind::classify(statement) {
            StatementKind::Query => {
                let wrapped = format!("SELECT row_to_json(q)::text FROM ({statement}) q");
                let rows: Vec<String> = sqlx::query_scalar(&wrapped)
                    .fetch_all(self.pool())
                    .await
                    .map_err(map_query_err("console.query"))?;
                Ok(StatementOutcome::Rows(rows))
            }
            StatementKind::Utility => {
                let rows = sqlx::query(statement)
                    .fetch_all(self.pool())
                    .await
                    .map_err(map_query_err("console.utility"))?;
                let lines = rows
                    .iter()
                    .map(|row| {
                        (0..row.len())
                            .map(|index| {
                                row.try_get::<Option<String>, _>(index)
                                    .ok()
                                    .flatten()
                                    .unwrap_or_default()
                            })
                            .collect::<Vec<_>>()
                            .join(" | ")
                    })
                    .collect();
                Ok(StatementOutcome::Rows(lines))
            }
            StatementKind::Command => {
                let done = sqlx::raw_sql(statement)
                    .execute(self.pool())
                    .await
                    .map_err(map_write_err("console.command"))?;
                Ok(StatementOutcome::Affected(done.rows_affected()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_classify_by_leading_keyword() {
        assert_eq!(StatementKind::classify("select 1"), StatementKind::Query);
        assert_eq!(
            StatementKind::classify("  WITH x AS (SELECT 1) SELECT * FROM x"),
            StatementKind::Query
        );
        assert_eq!(StatementKind::classify("table users"), StatementKind::Query);
        assert_eq!(StatementKind::classify("show server_version"), StatementKind::Utility);
        assert_eq!(
            StatementKind::classify("explain select 1"),
            StatementKind::Utility
        );
        assert_eq!(
            StatementKind::classify("DELETE FROM users"),
            StatementKind::Command
        );
        assert_eq!(StatementKind::classify(""), StatementKind::Command);
    }
}
