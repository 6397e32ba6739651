// crates/jobs/src/types.rs
//! Types shared by the build job system.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

/// Length of the external build handle.
pub const JOB_ID_LEN: usize = 8;

/// Opaque external handle for a build, e.g. `"3f9a1c07"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random id from the first characters of a v4 UUID.
    pub fn generate() -> Self {
        let mut hex = uuid::Uuid::new_v4().simple().to_string();
        hex.truncate(JOB_ID_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Lifecycle of a build record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum JobStatus {
    Running = 0,
    Completed = 1,
    Failed = 2,
}

impl JobStatus {
    /// Returns `None` for values outside the valid range.
    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Running),
            1 => Some(Self::Completed),
            2 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Point-in-time view of a build, returned by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub build_id: JobId,
    pub status: JobStatus,
    pub pending_events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
