// crates/jobs/src/session.rs
//! Replay-then-tail delivery of one build's log to one client.

use std::future::Future;
use std::sync::Arc;

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::queue::Pop;
use crate::record::JobRecord;
use crate::types::JobStatus;

/// Lets a session find out that the remote peer went away.
pub trait DisconnectProbe: Send + Sync + 'static {
    /// Non-blocking check.
    fn is_disconnected(&self) -> bool;

    /// Resolves once the peer is gone.
    fn disconnected(&self) -> impl Future<Output = ()> + Send + '_;
}

impl DisconnectProbe for CancellationToken {
    fn is_disconnected(&self) -> bool {
        self.is_cancelled()
    }

    fn disconnected(&self) -> impl Future<Output = ()> + Send + '_ {
        self.cancelled()
    }
}

/// A channel sender reports a disconnect once its receiver is dropped.
impl<T: Send + 'static> DisconnectProbe for mpsc::Sender<T> {
    fn is_disconnected(&self) -> bool {
        self.is_closed()
    }

    fn disconnected(&self) -> impl Future<Output = ()> + Send + '_ {
        self.closed()
    }
}

/// What a session hands to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Line(String),
    /// The build completed and every line has been delivered.
    Done,
    /// The producer failed; every line it pushed has been delivered.
    Failed { reason: String },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Line(_))
    }
}

/// One client's view of a build.
///
/// Pops from the record's queue, so two sessions on the same build split its
/// lines between them rather than each receiving all of them.
pub struct StreamSession<P> {
    record: Arc<JobRecord>,
    probe: P,
}

impl<P: DisconnectProbe> StreamSession<P> {
    pub fn new(record: Arc<JobRecord>, probe: P) -> Self {
        Self { record, probe }
    }

    /// Consume the session as a stream of events.
    ///
    /// Lines already queued are replayed first, then new lines are tailed as
    /// they arrive. The stream ends with exactly one [`StreamEvent::Done`] or
    /// [`StreamEvent::Failed`], or with no terminal event at all if the probe
    /// reports a disconnect.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        let Self { record, probe } = self;
        async_stream::stream! {
            let events = record.events();
            let build_id = record.id().clone();

            while let Some(line) = events.try_pop() {
                yield StreamEvent::Line(line);
            }

            while !record.status().is_terminal() || !events.is_empty() {
                if probe.is_disconnected() {
                    debug!(%build_id, "client disconnected");
                    return;
                }
                match events.pop_blocking(probe.disconnected()).await {
                    Pop::Item(line) => yield StreamEvent::Line(line),
                    Pop::Closed => break,
                    Pop::Cancelled => {
                        debug!(%build_id, "client disconnected while waiting");
                        return;
                    }
                }
            }

            match record.status() {
                JobStatus::Completed => yield StreamEvent::Done,
                JobStatus::Failed => {
                    let reason = record
                        .failure()
                        .unwrap_or_else(|| "build failed".to_string());
                    yield StreamEvent::Failed { reason };
                }
                // Only reachable through `Pop::Closed`, which requires a
                // terminal status.
                JobStatus::Running => {}
            }
        }
    }
}
