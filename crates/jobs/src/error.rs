// crates/jobs/src/error.rs
use thiserror::Error;

use crate::types::JobId;

/// Errors raised by the job registry and by producers writing to a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Build not found: {0}")]
    NotFound(JobId),

    #[error("Build {0} has already finished")]
    Finished(JobId),

    #[error("Producer failed: {0}")]
    Producer(String),
}

impl JobError {
    pub fn producer(reason: impl Into<String>) -> Self {
        Self::Producer(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let id = JobId::from("deadbeef");
        assert_eq!(
            JobError::NotFound(id.clone()).to_string(),
            "Build not found: deadbeef"
        );
        assert_eq!(
            JobError::Finished(id).to_string(),
            "Build deadbeef has already finished"
        );
        assert_eq!(
            JobError::producer("disk full").to_string(),
            "Producer failed: disk full"
        );
    }
}
