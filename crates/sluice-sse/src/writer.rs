//! Outgoing event writer.
//!
//! [`SseWriter`] formats events and directives into wire bytes and forwards
//! them to a [`ResponseStream`] it owns. Closing is a one-shot transition:
//! the first [`close`](SseWriter::close) wins, later ones do nothing, and
//! every send that starts afterwards returns `false` without touching the
//! stream.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::event::{SseEvent, SseItem};
use crate::stream::ChannelStream;

/// The output side of a connection.
///
/// Implementations must accept concurrent `send` calls.
pub trait ResponseStream: Send + Sync {
    /// Write `bytes`. Returns `false` if they could not be written.
    fn send(&self, bytes: Bytes) -> bool;

    /// Release the connection. Called at most once by a writer.
    fn close(&self);

    /// True if the peer is known to be gone.
    fn is_closed(&self) -> bool {
        false
    }
}

/// A writer shared across tasks.
pub type SharedWriter<S = ChannelStream> = Arc<SseWriter<S>>;

/// Formats events onto an owned [`ResponseStream`].
///
/// All methods take `&self`; share a writer with [`SharedWriter`].
/// Formatting happens outside any lock and concurrent sends only hold a
/// shared lock while writing, so they do not wait for each other. `close`
/// takes the exclusive lock, which lets in-flight writes finish before the
/// stream is released.
///
/// # Example
///
/// ```
/// use sluice_sse::{SseBody, SseConfig, SseEvent};
///
/// let (writer, _body) = SseBody::channel(SseConfig::default());
/// assert!(writer.send(&SseEvent::typed("update", "42")));
/// writer.close();
/// assert!(!writer.send_data("late"));
/// ```
pub struct SseWriter<S: ResponseStream = ChannelStream> {
    closed: AtomicBool,
    stream: RwLock<Option<S>>,
    stream_id: Uuid,
    events_sent: AtomicU64,
}

impl<S: ResponseStream> SseWriter<S> {
    /// Create a writer owning `stream`.
    pub fn new(stream: S) -> Self {
        let stream_id = Uuid::now_v7();
        debug!(stream_id = %stream_id, "writer opened");
        sluice_telemetry::metrics::record_writer_opened();

        Self {
            closed: AtomicBool::new(false),
            stream: RwLock::new(Some(stream)),
            stream_id,
            events_sent: AtomicU64::new(0),
        }
    }

    /// Create a writer already wrapped for sharing.
    pub fn shared(stream: S) -> SharedWriter<S> {
        Arc::new(Self::new(stream))
    }

    /// Send an event.
    pub fn send(&self, event: &SseEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        self.write_event(event.to_bytes())
    }

    /// Send an event carrying only `data`.
    pub fn send_data(&self, data: impl Into<String>) -> bool {
        self.send(&SseEvent::with_data(data))
    }

    /// Send an event with a type and data.
    pub fn send_typed(&self, event_type: impl Into<String>, data: impl Into<String>) -> bool {
        self.send(&SseEvent::typed(event_type, data))
    }

    /// Send `value` as compact JSON data. An empty `event_type` leaves the
    /// type unset.
    ///
    /// Returns `false` if serialization fails.
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T, event_type: &str) -> bool {
        if self.is_closed() {
            return false;
        }
        match SseEvent::json(value) {
            Ok(event) => self.send(&event.event(event_type)),
            Err(err) => {
                warn!(stream_id = %self.stream_id, error = %err, "dropping unserializable event");
                false
            }
        }
    }

    /// Send a comment. An empty comment is a keep-alive heartbeat.
    pub fn send_comment(&self, text: &str) -> bool {
        self.send_item(&SseItem::comment(text))
    }

    /// Send a standalone retry directive.
    pub fn send_retry(&self, retry_ms: u64) -> bool {
        self.send_item(&SseItem::retry(retry_ms))
    }

    /// Send any item.
    pub fn send_item(&self, item: &SseItem) -> bool {
        if self.is_closed() {
            return false;
        }
        match item {
            SseItem::Event(event) => self.write_event(event.to_bytes()),
            _ => self.write(item.to_bytes()),
        }
    }

    /// Close the writer and release the stream. Only the first call has
    /// any effect.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let stream = self.stream.write().take();
        if let Some(stream) = stream {
            stream.close();
        }

        debug!(
            stream_id = %self.stream_id,
            events_sent = self.events_sent(),
            "writer closed"
        );
        sluice_telemetry::metrics::record_writer_closed();
    }

    /// True while the writer owns a live stream and has not been closed.
    pub fn is_open(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.stream
            .read()
            .as_ref()
            .is_some_and(|stream| !stream.is_closed())
    }

    /// Identifier of this stream, for logs.
    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    /// Number of events written successfully.
    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::Relaxed)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn write_event(&self, bytes: Bytes) -> bool {
        let sent = self.write(bytes);
        if sent {
            self.events_sent.fetch_add(1, Ordering::Relaxed);
            sluice_telemetry::metrics::record_event_sent();
        }
        sent
    }

    fn write(&self, bytes: Bytes) -> bool {
        let guard = self.stream.read();
        // Re-checked under the lock: no write starts once close has won.
        if self.is_closed() {
            return false;
        }
        match guard.as_ref() {
            Some(stream) => {
                let sent = stream.send(bytes);
                if !sent {
                    trace!(stream_id = %self.stream_id, "stream rejected write");
                }
                sent
            }
            None => false,
        }
    }
}

impl<S: ResponseStream> Drop for SseWriter<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: ResponseStream> fmt::Debug for SseWriter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseWriter")
            .field("stream_id", &self.stream_id)
            .field("closed", &self.is_closed())
            .field("events_sent", &self.events_sent())
            .finish_non_exhaustive()
    }
}
