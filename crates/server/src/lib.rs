// crates/server/src/lib.rs
//! Buildstream server library.
//!
//! Axum HTTP server that starts simulated builds and streams their logs to
//! browsers over Server-Sent Events.

pub mod config;
pub mod error;
pub mod routes;
pub mod sse;
pub mod state;

pub use config::Config;
pub use error::*;
pub use routes::app_routes;
pub use state::{AppState, StreamSettings};

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS policy allowing `origins` with any method and header.
///
/// An entry of `*` allows every origin. Entries that are not valid header
/// values are skipped with a warning.
pub fn cors_layer<S: AsRef<str>>(origins: &[S]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o.as_ref() == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.as_ref()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(origin = origin.as_ref(), error = %e, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - Build and health routes
/// - CORS for the given origins
/// - Request tracing
pub fn create_app(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .merge(app_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
