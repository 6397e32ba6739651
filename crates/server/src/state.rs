// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use buildstream_jobs::{JobRegistry, JobRunner};

/// How log streams are delivered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Interval for SSE keep-alive comments; `None` sends none.
    pub keep_alive: Option<Duration>,
    /// Events buffered between a session and its response body.
    pub buffer: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            keep_alive: Some(Duration::from_secs(15)),
            buffer: 64,
        }
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Every build started by this process that has not been reaped.
    pub registry: Arc<JobRegistry>,
    /// Starts builds against the registry.
    pub runner: JobRunner,
    pub stream: StreamSettings,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(runner: JobRunner) -> Arc<Self> {
        Self::with_settings(runner, StreamSettings::default())
    }

    pub fn with_settings(runner: JobRunner, stream: StreamSettings) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            registry: Arc::new(JobRegistry::new()),
            runner,
            stream,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_new() {
        let state = AppState::new(JobRunner::default());
        assert!(state.uptime_secs() < 1);
        assert!(state.registry.is_empty());
        assert_eq!(state.stream, StreamSettings::default());
    }
}
