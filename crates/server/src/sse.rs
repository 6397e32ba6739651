// crates/server/src/sse.rs
//! Framing of session events as Server-Sent Events, and the task that feeds
//! a response body.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::Event;
use buildstream_jobs::{JobRecord, StreamEvent, StreamSession};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Body stream of an SSE response.
pub type EventStream = ReceiverStream<Result<Event, Infallible>>;

/// Frame one session event.
///
/// | Event             | Wire format                                  |
/// |-------------------|----------------------------------------------|
/// | log line          | `data: "<json string>"`                      |
/// | build completed   | `event: done` + `data: {}`                   |
/// | producer failed   | `event: failed` + `data: {"reason": "..."}`  |
pub fn frame(event: &StreamEvent) -> Event {
    match event {
        StreamEvent::Line(line) => {
            Event::default().data(serde_json::to_string(line).unwrap_or_default())
        }
        StreamEvent::Done => Event::default().event("done").data("{}"),
        StreamEvent::Failed { reason } => Event::default()
            .event("failed")
            .data(serde_json::json!({ "reason": reason }).to_string()),
    }
}

/// Run a session for `record` on its own task and return the receiving end.
///
/// The session's disconnect probe is the channel itself: once the response
/// body (the receiver) is dropped, the session stops at its next wait.
pub fn spawn_session(record: Arc<JobRecord>, buffer: usize) -> EventStream {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let probe = tx.clone();

    tokio::spawn(async move {
        let build_id = record.id().clone();
        let events = StreamSession::new(record, probe).into_stream();
        tokio::pin!(events);

        let mut delivered = 0usize;
        while let Some(event) = events.next().await {
            if tx.send(Ok(frame(&event))).await.is_err() {
                debug!(%build_id, delivered, "stream body dropped");
                return;
            }
            delivered += 1;
        }
        debug!(%build_id, delivered, "stream finished");
    });

    ReceiverStream::new(rx)
}
