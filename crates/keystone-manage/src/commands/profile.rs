//! Serve the application under the request profiler.

use std::path::PathBuf;

use keystone_api::{ApiServer, ApiState, ProfilerConfig};
use tracing::{info, warn};

use crate::context::CommandContext;
use crate::error::{CliError, CliResult};

pub(crate) async fn handle_profile(
    ctx: &CommandContext,
    length: usize,
    profile_dir: Option<PathBuf>,
) -> CliResult<()> {
    let db = ctx.database().await?.clone();
    let server = ApiServer::with_profiler(
        ApiState::shared(db),
        ProfilerConfig {
            length,
            profile_dir,
        },
    )
    .map_err(CliError::failure)?;
    server
        .serve(ctx.config().bind_addr, shutdown_signal())
        .await
        .map_err(CliError::failure)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "failed to listen for shutdown signal; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
