// crates/server/src/routes/builds.rs
//! API routes for starting builds and following their logs.
//!
//! - POST /build/start       — Start a build, returns its id
//! - GET  /build/{id}        — Status snapshot of a build
//! - GET  /build/{id}/stream — SSE stream of the build's log lines

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use buildstream_jobs::{JobId, JobSnapshot};
use serde::Serialize;

use crate::error::ApiResult;
use crate::sse;
use crate::state::AppState;

/// Tells nginx-style proxies not to buffer the event stream.
const X_ACCEL_BUFFERING: &str = "x-accel-buffering";

/// Response for POST /build/start.
#[derive(Debug, Serialize)]
pub struct StartBuildResponse {
    pub build_id: JobId,
}

/// POST /build/start — Register a build and run it in the background.
async fn start_build(State(state): State<Arc<AppState>>) -> (StatusCode, Json<StartBuildResponse>) {
    let record = state.runner.start(&state.registry);
    (
        StatusCode::CREATED,
        Json(StartBuildResponse {
            build_id: record.id().clone(),
        }),
    )
}

/// GET /build/{id} — Current status and backlog of a build.
async fn build_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    let record = state.registry.get(&id)?;
    Ok(Json(record.snapshot()))
}

/// GET /build/{id}/stream — SSE stream of a build's log.
///
/// Lines queued before the client attached are sent first, then new lines as
/// the build produces them. The stream ends with a `done` event, or a
/// `failed` event if the build crashed. Unknown ids get a 404 and no stream.
///
/// Cross-origin access follows the app's CORS allow-list like every other
/// route; a browser `EventSource` on an unlisted origin is refused. Start the
/// server with `--allowed-origin '*'` to accept any origin.
async fn stream_build(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let record = state.registry.get(&id)?;
    tracing::info!(
        build_id = %record.id(),
        backlog = record.events().len(),
        status = record.status().as_str(),
        "client attached to build stream"
    );

    let headers = [(X_ACCEL_BUFFERING, "no")];
    let stream = Sse::new(sse::spawn_session(record, state.stream.buffer));
    let response = match state.stream.keep_alive {
        Some(interval) => {
            (headers, stream.keep_alive(KeepAlive::new().interval(interval))).into_response()
        }
        None => (headers, stream).into_response(),
    };
    Ok(response)
}

/// Build the builds router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/build/start", post(start_build))
        .route("/build/{id}", get(build_status))
        .route("/build/{id}/stream", get(stream_build))
}
