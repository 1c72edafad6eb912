//! Recording parser handler.

use std::sync::Arc;

use parking_lot::Mutex;
use sluice_sse::{ResponseHead, SseEvent, SseHandler, Termination};

/// Everything a [`RecordingHandler`] has seen.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    /// Response heads, in order.
    pub heads: Vec<ResponseHead>,
    /// Dispatched events, in order.
    pub events: Vec<SseEvent>,
    /// Closed notifications with the head reported alongside.
    pub closed: Vec<(Termination, Option<ResponseHead>)>,
}

/// Shared view of a [`RecordingHandler`]'s output.
///
/// Stays readable after the handler was moved into a parser.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    inner: Arc<Mutex<Recording>>,
}

impl Recorded {
    /// Copy of everything recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Recording {
        self.inner.lock().clone()
    }

    /// Dispatched events.
    #[must_use]
    pub fn events(&self) -> Vec<SseEvent> {
        self.inner.lock().events.clone()
    }

    /// Data of every dispatched event.
    #[must_use]
    pub fn event_data(&self) -> Vec<String> {
        self.inner
            .lock()
            .events
            .iter()
            .map(|e| e.data.clone())
            .collect()
    }

    /// Response heads.
    #[must_use]
    pub fn heads(&self) -> Vec<ResponseHead> {
        self.inner.lock().heads.clone()
    }

    /// Number of closed notifications.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.inner.lock().closed.len()
    }

    /// The first termination reported, if any.
    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        self.inner.lock().closed.first().map(|(t, _)| t.clone())
    }

    /// Panics unless exactly one closed notification was recorded.
    pub fn assert_closed_once(&self) {
        let count = self.close_count();
        assert_eq!(count, 1, "expected exactly one close notification, got {count}");
    }
}

/// [`SseHandler`] that records every notification.
///
/// # Example
///
/// ```
/// use sluice_sse::{ResponseFrameParser, Termination};
/// use sluice_test::RecordingHandler;
///
/// let handler = RecordingHandler::new();
/// let recorded = handler.recorded();
///
/// let mut parser = ResponseFrameParser::new(handler);
/// parser.feed_bytes(b"HTTP/1.1 200 OK\r\n\r\ndata: x\n\n").unwrap();
/// parser.on_close(Termination::Completed);
///
/// assert_eq!(recorded.event_data(), ["x"]);
/// recorded.assert_closed_once();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    recorded: Recorded,
}

impl RecordingHandler {
    /// Create a handler with an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recording.
    #[must_use]
    pub fn recorded(&self) -> Recorded {
        self.recorded.clone()
    }
}

impl SseHandler for RecordingHandler {
    fn on_event(&mut self, event: SseEvent) {
        self.recorded.inner.lock().events.push(event);
    }

    fn on_headers(&mut self, head: &ResponseHead) {
        self.recorded.inner.lock().heads.push(head.clone());
    }

    fn on_closed(&mut self, result: Termination, head: Option<&ResponseHead>) {
        self.recorded
            .inner
            .lock()
            .closed
            .push((result, head.cloned()));
    }
}
