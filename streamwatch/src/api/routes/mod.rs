//! API route modules.

pub mod health;
pub mod sync;

use axum::Router;

use crate::api::server::AppState;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(sync::router())
        .merge(health::router())
        .with_state(state)
}
