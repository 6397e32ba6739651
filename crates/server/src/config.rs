// crates/server/src/config.rs
//! Command-line and environment configuration for the server binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use crate::state::StreamSettings;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 8000;

/// Origins of the Vite dev server, allowed by default.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

#[derive(Debug, Clone, Parser)]
#[command(name = "buildstream", version, about = "Stream live build logs over Server-Sent Events")]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "BUILDSTREAM_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to bind.
    #[arg(long, short, env = "BUILDSTREAM_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Browser origins allowed by CORS. `*` allows any origin.
    #[arg(
        long = "allowed-origin",
        env = "BUILDSTREAM_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,

    /// Seconds between SSE keep-alive comments on idle streams. 0 disables.
    #[arg(long, env = "BUILDSTREAM_KEEP_ALIVE_SECS", default_value_t = 15)]
    pub keep_alive_secs: u64,

    /// Forget finished builds this many seconds after they end. 0 keeps them forever.
    #[arg(long, env = "BUILDSTREAM_REAP_AFTER_SECS", default_value_t = 900)]
    pub reap_after_secs: u64,

    /// Seconds between sweeps for finished builds.
    #[arg(long, env = "BUILDSTREAM_REAP_INTERVAL_SECS", default_value_t = 60)]
    pub reap_interval_secs: u64,

    /// Events buffered per stream between the session and the socket.
    #[arg(long, env = "BUILDSTREAM_STREAM_BUFFER", default_value_t = 64)]
    pub stream_buffer: usize,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn reap_after(&self) -> Option<Duration> {
        (self.reap_after_secs > 0).then(|| Duration::from_secs(self.reap_after_secs))
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs.max(1))
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            keep_alive: (self.keep_alive_secs > 0)
                .then(|| Duration::from_secs(self.keep_alive_secs)),
            buffer: self.stream_buffer.max(1),
        }
    }
}
