//! Sync trigger route.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::sync::{SyncOptions, SyncReport};

#[derive(Debug, Default, Deserialize)]
pub struct SyncParams {
    #[serde(default)]
    pub refresh_upcoming: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sync", post(run_sync))
}

/// Run one synchronization pass.
async fn run_sync(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> ApiResult<Json<SyncReport>> {
    let sync = state
        .sync
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Sync service not initialized"))?;

    let report = sync
        .run(SyncOptions {
            refresh_upcoming: params.refresh_upcoming,
        })
        .await?;
    Ok(Json(report))
}
