// crates/server/src/main.rs
//! Buildstream server binary.
//!
//! Parses configuration, starts the reaper for finished builds and serves the
//! HTTP API until Ctrl-C.

use anyhow::{Context, Result};
use buildstream_jobs::JobRunner;
use buildstream_server::{cors_layer, create_app, AppState, Config};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,buildstream_server=info,buildstream_jobs=info".into()),
        )
        .init();

    let config = Config::parse();

    let state = AppState::with_settings(JobRunner::default(), config.stream_settings());
    match config.reap_after() {
        Some(ttl) => {
            state.registry.spawn_reaper(config.reap_interval(), ttl);
            info!(ttl_secs = ttl.as_secs(), "finished builds will be reaped");
        }
        None => info!("finished builds are kept until shutdown"),
    }

    let app = create_app(state, cors_layer(&config.allowed_origins));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("buildstream listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
