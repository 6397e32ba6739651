// crates/jobs/src/lib.rs
//! Build jobs and live delivery of their logs.
//!
//! Provides:
//! - `JobRegistry`: id → record map, with optional reaping of finished builds
//! - `JobRecord`: lifecycle status plus the queue of undelivered log lines
//! - `JobRunner` / `BuildScript`: the simulated build producer, supervised
//! - `StreamSession`: replay-then-tail delivery to one client

pub mod error;
pub mod lines;
pub mod queue;
pub mod record;
pub mod registry;
pub mod runner;
pub mod session;
pub mod types;

pub use error::{JobError, Result};
pub use queue::{EventQueue, Pop};
pub use record::JobRecord;
pub use registry::JobRegistry;
pub use runner::{supervise, BuildScript, JobRunner, DEFAULT_PHASES};
pub use session::{DisconnectProbe, StreamEvent, StreamSession};
pub use types::{JobId, JobSnapshot, JobStatus};
