//! Route listing.

use keystone_api::{RouteEntry, route_table};

use crate::error::{CliError, CliResult};

pub(crate) fn handle_routes() -> CliResult<()> {
    let table = route_table().map_err(CliError::failure)?;
    print!("{}", render_routes(table.entries()));
    Ok(())
}

/// One rule per line, in registration order.
pub(crate) fn render_routes(entries: &[RouteEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}\n", entry.path))
        .collect()
}
