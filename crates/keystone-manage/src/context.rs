//! Per-invocation command context.

use anyhow::Context as _;
use keystone_config::AppConfig;
use keystone_data::Database;
use tokio::sync::OnceCell;

use crate::error::{CliError, CliResult};

/// Everything a command may need, built once per invocation.
///
/// The storage pool is opened on first use so commands that never touch the
/// database (such as `routes` and `test`) work without a configured or
/// reachable server.
pub(crate) struct CommandContext {
    config: AppConfig,
    database: OnceCell<Database>,
}

impl CommandContext {
    pub(crate) fn new(config: AppConfig) -> Self {
        Self {
            config,
            database: OnceCell::new(),
        }
    }

    pub(crate) const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Storage handle, connecting on first call.
    ///
    /// A missing database URL is a validation error.
    pub(crate) async fn database(&self) -> CliResult<&Database> {
        self.database
            .get_or_try_init(|| async {
                let url = self.config.require_database_url()?;
                Database::connect(url, self.config.max_connections)
                    .await
                    .with_context(|| {
                        format!(
                            "cannot reach database at {}",
                            self.config.redacted_database_url()
                        )
                    })
                    .map_err(CliError::failure)
            })
            .await
    }

    /// Release the storage pool if it was opened.
    pub(crate) async fn close(&self) {
        if let Some(database) = self.database.get() {
            database.close().await;
        }
    }
}
