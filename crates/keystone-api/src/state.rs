//! Shared state handed to every request handler.

use std::sync::Arc;

use keystone_data::Database;

/// State shared by all handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Storage handle.
    pub db: Database,
}

impl ApiState {
    /// Wrap `db` for sharing across handlers.
    #[must_use]
    pub fn shared(db: Database) -> Arc<Self> {
        Arc::new(Self { db })
    }
}
