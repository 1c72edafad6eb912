//! SSE event types.
//!
//! [`SseEvent`] is the value the assembler dispatches and the writer formats.
//! [`SseItem`] covers everything that can be put on the wire, including the
//! comment and standalone retry directives.

use std::fmt::Write as _;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{SseError, SseResult};

/// Event type reported for events that did not carry an `event:` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A Server-Sent Event.
///
/// All fields default to empty (`retry_ms` to 0, meaning "not specified").
/// An event is only dispatched by the assembler when `data` is non-empty.
///
/// # Example
///
/// ```
/// use sluice_sse::SseEvent;
///
/// let event = SseEvent::with_data("Hello, World!")
///     .id("1")
///     .event("greeting");
///
/// assert_eq!(event.data, "Hello, World!");
/// assert_eq!(event.id, "1");
/// assert_eq!(event.event_type, "greeting");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SseEvent {
    /// Event type. Empty means "message".
    pub event_type: String,
    /// Event payload; multiple `data:` lines are joined with `\n`.
    pub data: String,
    /// Event id.
    pub id: String,
    /// Reconnection delay hint in milliseconds, 0 if not specified.
    pub retry_ms: u64,
}

impl SseEvent {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an event with the given data.
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Create an event with an event type and data.
    pub fn typed(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            ..Self::default()
        }
    }

    /// Create an event whose data is the compact JSON encoding of `value`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> SseResult<Self> {
        let data = serde_json::to_string(value)
            .map_err(|e| SseError::serialization_failed(e.to_string()))?;
        Ok(Self::with_data(data))
    }

    /// Set the event type.
    pub fn event(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Set the event id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the retry hint. Sub-millisecond precision is truncated.
    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry_ms = u64::try_from(retry.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the retry hint in milliseconds.
    pub fn retry_ms(mut self, retry_ms: u64) -> Self {
        self.retry_ms = retry_ms;
        self
    }

    /// The retry hint as a duration, if one was set.
    pub fn retry_interval(&self) -> Option<Duration> {
        (self.retry_ms > 0).then(|| Duration::from_millis(self.retry_ms))
    }

    /// True when the event carries data and may be dispatched.
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }

    /// Reset every field to its default.
    pub fn reset(&mut self) {
        self.event_type.clear();
        self.data.clear();
        self.id.clear();
        self.retry_ms = 0;
    }

    /// Format the event as an SSE text block.
    ///
    /// ```text
    /// event:<type>      only if the type is non-empty
    /// id:<id>           only if the id is non-empty
    /// retry:<ms>        only if the retry hint is positive
    /// data:<line>       one per line of data, "data:" if data is empty
    ///
    /// ```
    pub fn to_sse_string(&self) -> String {
        let mut out = String::with_capacity(self.data.len() + 32);

        if !self.event_type.is_empty() {
            out.push_str("event:");
            out.push_str(&self.event_type);
            out.push('\n');
        }

        if !self.id.is_empty() {
            out.push_str("id:");
            out.push_str(&self.id);
            out.push('\n');
        }

        if self.retry_ms > 0 {
            let _ = writeln!(out, "retry:{}", self.retry_ms);
        }

        // Empty data still yields a single bare `data:` line.
        for line in data_lines(&self.data) {
            out.push_str("data:");
            out.push_str(line);
            out.push('\n');
        }

        out.push('\n');
        out
    }

    /// Convert to bytes for sending.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_sse_string())
    }
}

impl From<String> for SseEvent {
    fn from(data: String) -> Self {
        Self::with_data(data)
    }
}

impl From<&str> for SseEvent {
    fn from(data: &str) -> Self {
        Self::with_data(data)
    }
}

// Every '\n'-separated segment gets its own line, including a trailing empty one.
fn data_lines(data: &str) -> impl Iterator<Item = &str> {
    data.split('\n')
}

/// An item that can be written to an SSE stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseItem {
    /// An event.
    Event(SseEvent),
    /// A comment line, ignored by readers. Empty text is a bare heartbeat.
    Comment(String),
    /// A standalone reconnection delay directive in milliseconds.
    Retry(u64),
}

impl SseItem {
    /// Create an event item.
    pub fn event(event: SseEvent) -> Self {
        Self::Event(event)
    }

    /// Create a comment item.
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Create an empty keep-alive comment.
    pub fn keepalive() -> Self {
        Self::Comment(String::new())
    }

    /// Create a retry directive.
    pub fn retry(ms: u64) -> Self {
        Self::Retry(ms)
    }

    /// Check if this is an event.
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    /// Get the event if this is one.
    pub fn as_event(&self) -> Option<&SseEvent> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }

    /// Format as SSE text.
    pub fn to_sse_string(&self) -> String {
        match self {
            Self::Event(e) => e.to_sse_string(),
            Self::Comment(text) => format!(":{text}\n\n"),
            Self::Retry(ms) => format!("retry:{ms}\n\n"),
        }
    }

    /// Convert to bytes.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_sse_string())
    }
}

impl From<SseEvent> for SseItem {
    fn from(event: SseEvent) -> Self {
        Self::Event(event)
    }
}
