// crates/jobs/src/runner.rs
//! Simulated build producer and the supervisor that records its outcome.

use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::JobError;
use crate::lines;
use crate::record::JobRecord;
use crate::registry::JobRegistry;

pub const DEFAULT_PHASES: [&str; 8] = [
    "Cloning repository",
    "Installing dependencies",
    "Running tests",
    "Building assets",
    "Packaging artifacts",
    "Deploying to staging",
    "Smoke tests",
    "Deploying to production",
];

/// The phases a build walks through and how it is paced.
#[derive(Debug, Clone)]
pub struct BuildScript {
    phases: Vec<String>,
    detail_lines: RangeInclusive<usize>,
    detail_delay: RangeInclusive<Duration>,
    phase_delay: RangeInclusive<Duration>,
    fail_in: Option<String>,
}

impl Default for BuildScript {
    fn default() -> Self {
        Self {
            phases: DEFAULT_PHASES.iter().map(|p| p.to_string()).collect(),
            detail_lines: 1..=4,
            detail_delay: Duration::from_millis(100)..=Duration::from_millis(400),
            phase_delay: Duration::from_millis(600)..=Duration::from_millis(1400),
            fail_in: None,
        }
    }
}

impl BuildScript {
    /// Default pacing with a custom phase list.
    pub fn with_phases<I, S>(phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phases: phases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn detail_lines(mut self, range: RangeInclusive<usize>) -> Self {
        self.detail_lines = range;
        self
    }

    pub fn detail_delay(mut self, range: RangeInclusive<Duration>) -> Self {
        self.detail_delay = range;
        self
    }

    pub fn phase_delay(mut self, range: RangeInclusive<Duration>) -> Self {
        self.phase_delay = range;
        self
    }

    /// Same phases and detail counts, no waiting.
    pub fn instant(self) -> Self {
        self.detail_delay(Duration::ZERO..=Duration::ZERO)
            .phase_delay(Duration::ZERO..=Duration::ZERO)
    }

    /// Abort the build with an error right after `phase` starts.
    pub fn fail_in(mut self, phase: impl Into<String>) -> Self {
        self.fail_in = Some(phase.into());
        self
    }

    /// Push every line of the build into `record`.
    ///
    /// Does not touch the record's status; [`supervise`] does that once this
    /// future has returned.
    pub async fn run(&self, record: &JobRecord) -> Result<(), JobError> {
        for phase in &self.phases {
            pause(&self.phase_delay).await;
            record.push(lines::phase_started(&lines::timestamp(), phase))?;
            if self.fail_in.as_ref() == Some(phase) {
                return Err(JobError::producer(format!("{phase} failed")));
            }

            for n in 1..=pick(&self.detail_lines) {
                pause(&self.detail_delay).await;
                record.push(lines::phase_detail(&lines::timestamp(), phase, n))?;
            }

            record.push(lines::phase_completed(&lines::timestamp(), phase))?;
        }
        record.push(lines::build_succeeded(&lines::timestamp(), record.id()))?;
        Ok(())
    }
}

fn pick(range: &RangeInclusive<usize>) -> usize {
    if range.is_empty() {
        return *range.start();
    }
    rand::thread_rng().gen_range(range.clone())
}

async fn pause(range: &RangeInclusive<Duration>) {
    let delay = if range.start() >= range.end() {
        *range.start()
    } else {
        rand::thread_rng().gen_range(range.clone())
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Run `producer` on its own task and record how it ended.
///
/// `Ok` marks the record complete, `Err` marks it failed with the error
/// text, and a panic marks it failed as well. The terminal transition always
/// happens after the producer's last push.
pub fn supervise<F, Fut>(record: Arc<JobRecord>, producer: F) -> JoinHandle<()>
where
    F: FnOnce(Arc<JobRecord>) -> Fut,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    let work = tokio::spawn(producer(Arc::clone(&record)));
    tokio::spawn(async move {
        let build_id = record.id().clone();
        match work.await {
            Ok(Ok(())) => {
                record.mark_complete();
                info!(%build_id, "build completed");
            }
            Ok(Err(e)) => {
                warn!(%build_id, error = %e, "build failed");
                record.mark_failed(e.to_string());
            }
            Err(e) => {
                let reason = if e.is_panic() {
                    "producer task panicked"
                } else {
                    "producer task was cancelled"
                };
                warn!(%build_id, error = %e, "{reason}");
                record.mark_failed(reason);
            }
        }
    })
}

/// Starts builds: registers a record and runs the script against it.
#[derive(Clone)]
pub struct JobRunner {
    script: Arc<BuildScript>,
}

impl JobRunner {
    pub fn new(script: BuildScript) -> Self {
        Self {
            script: Arc::new(script),
        }
    }

    /// Register a new build and start it in the background. Returns without
    /// waiting for the build.
    pub fn start(&self, registry: &JobRegistry) -> Arc<JobRecord> {
        let record = registry.create();
        self.spawn(Arc::clone(&record));
        info!(build_id = %record.id(), "build started");
        record
    }

    /// Run the script against an existing record under supervision.
    pub fn spawn(&self, record: Arc<JobRecord>) -> JoinHandle<()> {
        let script = Arc::clone(&self.script);
        supervise(record, move |record| async move { script.run(&record).await })
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new(BuildScript::default())
    }
}
