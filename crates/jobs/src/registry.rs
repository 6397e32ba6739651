// crates/jobs/src/registry.rs
//! Process-wide map from build id to record.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{JobError, Result};
use crate::record::JobRecord;
use crate::types::JobId;

/// Holds the only long-lived reference to each build record.
///
/// Records are inserted by [`create`](Self::create) and removed only by
/// [`reap_finished`](Self::reap_finished). Streams keep their own `Arc`, so a
/// record reaped mid-stream stays alive until that stream ends.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<JobId, Arc<JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh record under a newly generated, unused id.
    pub fn create(&self) -> Arc<JobRecord> {
        loop {
            match self.jobs.entry(JobId::generate()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let record = Arc::new(JobRecord::new(slot.key().clone()));
                    slot.insert(Arc::clone(&record));
                    debug!(build_id = %record.id(), "build registered");
                    return record;
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<JobRecord>> {
        self.jobs
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| JobError::NotFound(JobId::from(id)))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drop records that finished at least `ttl` ago. Running builds are kept.
    pub fn reap_finished(&self, ttl: Duration) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, record| match record.finished_at() {
            Some(at) => at.elapsed() < ttl,
            None => true,
        });
        before.saturating_sub(self.jobs.len())
    }

    /// Spawn a background sweep calling [`reap_finished`](Self::reap_finished)
    /// every `interval`.
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration, ttl: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let reaped = registry.reap_finished(ttl);
                if reaped > 0 {
                    debug!(reaped, remaining = registry.len(), "reaped finished builds");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;

    #[test]
    fn test_create_then_get() {
        let registry = JobRegistry::new();
        let record = registry.create();

        let found = registry.get(record.id().as_str()).unwrap();
        assert!(Arc::ptr_eq(&record, &found));
        assert_eq!(found.status(), JobStatus::Running);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let registry = JobRegistry::new();
        let err = registry.get("missing1").unwrap_err();
        assert_eq!(err, JobError::NotFound(JobId::from("missing1")));
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let registry = JobRegistry::new();
        for _ in 0..100 {
            registry.create();
        }
        assert_eq!(registry.len(), 100);
    }

    #[test]
    fn test_reap_only_finished_past_ttl() {
        let registry = JobRegistry::new();
        let running = registry.create();
        let finished = registry.create();
        finished.mark_complete();

        // Not old enough yet.
        assert_eq!(registry.reap_finished(Duration::from_secs(60)), 0);

        assert_eq!(registry.reap_finished(Duration::ZERO), 1);
        assert!(registry.get(running.id().as_str()).is_ok());
        assert!(matches!(
            registry.get(finished.id().as_str()),
            Err(JobError::NotFound(_))
        ));
        // The caller's handle survives reaping.
        assert!(finished.is_completed());
    }

    #[tokio::test]
    async fn test_reaper_task_sweeps() {
        let registry = Arc::new(JobRegistry::new());
        let failed = registry.create();
        failed.mark_failed("boom");

        let reaper = registry.spawn_reaper(Duration::from_millis(10), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        reaper.abort();

        assert!(registry.is_empty());
    }
}
