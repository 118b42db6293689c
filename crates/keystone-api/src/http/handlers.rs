//! Endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use keystone_data::{Role, User};
use keystone_telemetry::build_sha;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) build: &'static str,
    pub(crate) database: &'static str,
}

#[instrument(name = "handlers.health", skip(state))]
pub(crate) async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(err) = state.db.ping().await {
        warn!(error = %err, "health check could not reach the database");
        return Err(ApiError::service_unavailable("database unreachable"));
    }
    Ok(Json(HealthResponse {
        status: "ok",
        build: build_sha(),
        database: "ok",
    }))
}

#[instrument(name = "handlers.list_roles", skip(state))]
pub(crate) async fn list_roles(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.db.list_roles().await?))
}

#[instrument(name = "handlers.list_users", skip(state))]
pub(crate) async fn list_users(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.db.list_users().await?))
}

#[instrument(name = "handlers.get_user", skip(state))]
pub(crate) async fn get_user(
    State(state): State<Arc<ApiState>>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .db
        .find_user_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("user `{username}` not found")))
}
