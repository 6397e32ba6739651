// crates/jobs/src/record.rs
//! State for a single build: its id, lifecycle and event queue.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::Instant;

use crate::error::{JobError, Result};
use crate::queue::EventQueue;
use crate::types::{JobId, JobSnapshot, JobStatus};

/// A build and the log lines it has produced but nobody has read yet.
///
/// The status word is written with `Release` after the producer's last push
/// and read with `Acquire`, so a reader that sees a terminal status also sees
/// every line pushed before it.
pub struct JobRecord {
    id: JobId,
    status: AtomicU8,
    failure: RwLock<Option<String>>,
    finished_at: OnceLock<Instant>,
    events: EventQueue<String>,
}

impl fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRecord")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl JobRecord {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: AtomicU8::new(JobStatus::Running as u8),
            failure: RwLock::new(None),
            finished_at: OnceLock::new(),
            events: EventQueue::new(),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn events(&self) -> &EventQueue<String> {
        &self.events
    }

    /// Append a log line. Fails once the build has reached a terminal state.
    pub fn push(&self, line: impl Into<String>) -> Result<()> {
        if self.status().is_terminal() {
            return Err(JobError::Finished(self.id.clone()));
        }
        self.events.push(line.into());
        Ok(())
    }

    pub fn status(&self) -> JobStatus {
        let raw = self.status.load(Ordering::Acquire);
        JobStatus::from_u8(raw).unwrap_or(JobStatus::Failed)
    }

    pub fn is_completed(&self) -> bool {
        self.status() == JobStatus::Completed
    }

    /// Mark the build successful. Idempotent; ignored if it already failed.
    pub fn mark_complete(&self) -> bool {
        self.finish(JobStatus::Completed)
    }

    /// Mark the build failed. Idempotent; ignored if it already completed.
    pub fn mark_failed(&self, reason: impl Into<String>) -> bool {
        if self.status().is_terminal() {
            return false;
        }
        match self.failure.write() {
            Ok(mut guard) => {
                guard.get_or_insert_with(|| reason.into());
            }
            Err(e) => tracing::error!("RwLock poisoned writing failure reason: {e}"),
        }
        self.finish(JobStatus::Failed)
    }

    /// Returns true if this call performed the transition.
    fn finish(&self, terminal: JobStatus) -> bool {
        let swapped = self
            .status
            .compare_exchange(
                JobStatus::Running as u8,
                terminal as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if swapped {
            let _ = self.finished_at.set(Instant::now());
            self.events.close();
        }
        swapped
    }

    /// Why the producer failed, if it did.
    pub fn failure(&self) -> Option<String> {
        if self.status() != JobStatus::Failed {
            return None;
        }
        match self.failure.read() {
            Ok(g) => g.clone(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading failure reason: {e}");
                None
            }
        }
    }

    /// When the build reached a terminal state.
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at.get().copied()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            build_id: self.id.clone(),
            status: self.status(),
            pending_events: self.events.len(),
            error: self.failure(),
        }
    }
}
