//! HTTP route handlers for the buildstream server.

pub mod builds;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - GET  /health - Health check
/// - POST /build/start - Start a build
/// - GET  /build/{id} - Build status snapshot
/// - GET  /build/{id}/stream - SSE stream of a build's log
pub fn app_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(builds::router())
        .with_state(state)
}
