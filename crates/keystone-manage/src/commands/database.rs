//! Schema and migration commands.

use anyhow::Context as _;
use tracing::info;

use crate::context::CommandContext;
use crate::error::{CliError, CliResult};

pub(crate) async fn handle_create_db(ctx: &CommandContext) -> CliResult<()> {
    ctx.database().await?.create_all().await?;
    println!("Database created successfully.");
    Ok(())
}

pub(crate) async fn handle_drop_db(ctx: &CommandContext) -> CliResult<()> {
    ctx.database().await?.drop_all().await?;
    info!("declared tables dropped");
    println!("Database dropped successfully.");
    Ok(())
}

pub(crate) async fn handle_db_upgrade(ctx: &CommandContext) -> CliResult<()> {
    let report = ctx
        .database()
        .await?
        .upgrade()
        .await
        .context("database upgrade failed")
        .map_err(CliError::failure)?;
    info!(
        applied = ?report.applied,
        current = ?report.current,
        "migrations up to date"
    );
    println!("Database upgrade complete.");
    Ok(())
}
