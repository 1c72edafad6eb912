//! Channel-backed output stream and HTTP response body.
//!
//! [`SseBody::channel`] pairs an [`SseWriter`] with a body that yields the
//! writer's bytes, so a handler can return the body while producers keep
//! writing from other tasks.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http::header::{HeaderName, HeaderValue, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use http::HeaderMap;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::config::SseConfig;
use crate::error::SseError;
use crate::event::SseItem;
use crate::writer::{ResponseStream, SseWriter};

/// Content type of an event stream.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// [`ResponseStream`] that hands bytes to an [`SseBody`].
#[derive(Debug)]
pub struct ChannelStream {
    tx: mpsc::UnboundedSender<Bytes>,
    closed: Arc<AtomicBool>,
}

impl ResponseStream for ChannelStream {
    fn send(&self, bytes: Bytes) -> bool {
        !self.closed.load(Ordering::Acquire) && self.tx.send(bytes).is_ok()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }
}

/// Response body yielding the bytes written to its paired writer.
///
/// The first frame is the configured retry hint, if any. While no bytes are
/// pending an empty comment is emitted every keep-alive interval. The body
/// ends once the writer is closed and the buffered bytes are drained.
#[derive(Debug)]
pub struct SseBody {
    rx: mpsc::UnboundedReceiver<Bytes>,
    closed: Arc<AtomicBool>,
    initial_retry: Option<Bytes>,
    keep_alive_period: Option<Duration>,
    keep_alive: Option<Interval>,
}

impl SseBody {
    /// Create a writer and the body it feeds.
    ///
    /// Needs no runtime; the keep-alive timer starts on first poll.
    pub fn channel(config: SseConfig) -> (SseWriter<ChannelStream>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let stream = ChannelStream {
            tx,
            closed: Arc::clone(&closed),
        };

        let initial_retry = config.default_retry.map(|retry| {
            let ms = u64::try_from(retry.as_millis()).unwrap_or(u64::MAX);
            SseItem::retry(ms).to_bytes()
        });

        let body = Self {
            rx,
            closed,
            initial_retry,
            keep_alive_period: config.keep_alive_interval,
            keep_alive: None,
        };

        (SseWriter::new(stream), body)
    }

    /// True once the writer closed the stream.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Convert into a boxed body for a hyper response.
    pub fn into_http_body(self) -> UnsyncBoxBody<Bytes, SseError> {
        StreamBody::new(self.map_ok(Frame::data)).boxed_unsync()
    }

    fn poll_keep_alive(&mut self, cx: &mut Context<'_>) -> Poll<Bytes> {
        let Some(period) = self.keep_alive_period else {
            return Poll::Pending;
        };

        let keep_alive = self.keep_alive.get_or_insert_with(|| {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });

        match keep_alive.poll_tick(cx) {
            Poll::Ready(_) => Poll::Ready(SseItem::keepalive().to_bytes()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Stream for SseBody {
    type Item = Result<Bytes, SseError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if let Some(bytes) = this.initial_retry.take() {
            return Poll::Ready(Some(Ok(bytes)));
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(bytes)) => {
                if let Some(keep_alive) = this.keep_alive.as_mut() {
                    keep_alive.reset();
                }
                Poll::Ready(Some(Ok(bytes)))
            }
            Poll::Ready(None) => {
                this.closed.store(true, Ordering::Release);
                Poll::Ready(None)
            }
            Poll::Pending => this.poll_keep_alive(cx).map(|bytes| Some(Ok(bytes))),
        }
    }
}

/// Response headers for an event stream endpoint.
pub fn sse_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    // Disable proxy buffering
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    headers
}

/// Headers, writer and body for an event stream response.
pub fn sse_response(config: SseConfig) -> (HeaderMap, SseWriter<ChannelStream>, SseBody) {
    let (writer, body) = SseBody::channel(config);
    (sse_headers(), writer, body)
}
