//! HTTP response framing for an incoming event stream.
//!
//! [`ResponseFrameParser`] reads the status line and headers of an HTTP/1.x
//! response, picks the body framing, and feeds the body through a
//! [`ChunkDecoder`] (when chunked) into an [`EventAssembler`]. Events, the
//! response head and the final termination are reported to an
//! [`SseHandler`].
//!
//! The parser never blocks and never assumes a whole message is buffered:
//! each [`feed`](ResponseFrameParser::feed) consumes what it can and leaves
//! incomplete lines in the buffer.

use std::fmt;

use bytes::BytesMut;
use http::header::{HeaderName, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, StatusCode, Version};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::assembler::EventAssembler;
use crate::chunked::{ChunkDecoder, ChunkProgress};
use crate::config::SseConfig;
use crate::error::{SseError, SseResult};
use crate::event::SseEvent;
use crate::line::{find_line, trim_ows};

/// Where the parser is within the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// Reading the status line and headers.
    ExpectHeaders,
    /// Reading the body.
    ExpectBody,
    /// Body complete, fatal error, or connection closed. Terminal.
    Closed,
}

/// How the end of the response body is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// `Transfer-Encoding: chunked`.
    Chunked,
    /// `Content-Length: n`.
    ContentLength(u64),
    /// Neither header: the body ends when the connection does.
    UntilClose,
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The transport reached a clean end of stream.
    Completed,
    /// The response could not be parsed.
    BadResponse(String),
    /// The transport failed.
    NetworkFailure(String),
    /// The transport gave up waiting.
    Timeout,
    /// The caller cancelled the connection.
    Aborted,
}

impl Termination {
    /// True for [`Termination::Completed`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::BadResponse(_) => "bad_response",
            Self::NetworkFailure(_) => "network_failure",
            Self::Timeout => "timeout",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadResponse(reason) | Self::NetworkFailure(reason) => {
                write!(f, "{}: {reason}", self.label())
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// Status line and headers of a response.
///
/// Header names are lower-cased; repeated headers keep every value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// `HTTP/1.0` or `HTTP/1.1`.
    pub version: Version,
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

/// Receives the output of a [`ResponseFrameParser`].
///
/// All callbacks run synchronously inside `feed` or `on_close`, in arrival
/// order. `on_headers` is called at most once and `on_closed` exactly once
/// per connection.
///
/// Any `FnMut(SseEvent)` closure is a handler that only cares about events.
pub trait SseHandler {
    /// A complete event was dispatched.
    fn on_event(&mut self, event: SseEvent);

    /// The status line and all headers were read.
    fn on_headers(&mut self, head: &ResponseHead) {
        let _ = head;
    }

    /// The connection ended. `head` holds whatever part of the response
    /// head was read.
    fn on_closed(&mut self, result: Termination, head: Option<&ResponseHead>) {
        let _ = (result, head);
    }
}

impl<F> SseHandler for F
where
    F: FnMut(SseEvent),
{
    fn on_event(&mut self, event: SseEvent) {
        self(event);
    }
}

/// A parser notification, as delivered by [`ChannelHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Response head received.
    Headers(ResponseHead),
    /// Event dispatched.
    Event(SseEvent),
    /// Connection ended.
    Closed {
        /// Termination reason.
        result: Termination,
        /// Response head, if any part of it was read.
        head: Option<ResponseHead>,
    },
}

/// Handler forwarding every notification into an unbounded channel.
///
/// Lets an async consumer poll a connection driven elsewhere. Messages
/// sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelHandler {
    /// Create a handler and the receiver for its messages.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, message: ClientMessage) {
        if self.tx.send(message).is_err() {
            trace!("client message receiver dropped");
        }
    }
}

impl SseHandler for ChannelHandler {
    fn on_event(&mut self, event: SseEvent) {
        self.forward(ClientMessage::Event(event));
    }

    fn on_headers(&mut self, head: &ResponseHead) {
        self.forward(ClientMessage::Headers(head.clone()));
    }

    fn on_closed(&mut self, result: Termination, head: Option<&ResponseHead>) {
        self.forward(ClientMessage::Closed {
            result,
            head: head.cloned(),
        });
    }
}

/// Incremental parser for an HTTP/1.x response carrying an event stream.
///
/// One parser serves one connection. The transport calls
/// [`feed`](Self::feed) as bytes arrive and [`on_close`](Self::on_close)
/// when the connection ends.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use sluice_sse::{ParseStatus, ResponseFrameParser, SseEvent};
///
/// let mut events = Vec::new();
/// let mut parser = ResponseFrameParser::new(|event: SseEvent| events.push(event));
///
/// let mut buf = BytesMut::from(
///     &b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nc\r\ndata:Hello\n\n\r\n0\r\n\r\n"[..],
/// );
/// parser.feed(&mut buf).unwrap();
/// assert_eq!(parser.status(), ParseStatus::Closed);
/// drop(parser);
///
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].data, "Hello");
/// ```
#[derive(Debug)]
pub struct ResponseFrameParser<H> {
    handler: H,
    status: ParseStatus,
    head: Option<ResponseHead>,
    headers_received: bool,
    framing: Option<BodyFraming>,
    chunks: ChunkDecoder,
    assembler: EventAssembler,
    content_remaining: u64,
    body_bytes_read: u64,
    timed_out: bool,
    closed_notified: bool,
    buffer: BytesMut,
}

impl<H: SseHandler> ResponseFrameParser<H> {
    /// Create a parser reporting to `handler`.
    pub fn new(handler: H) -> Self {
        Self::with_config(handler, &SseConfig::default())
    }

    /// Create a parser whose internal read buffer is sized from `config`.
    pub fn with_config(handler: H, config: &SseConfig) -> Self {
        Self {
            handler,
            status: ParseStatus::ExpectHeaders,
            head: None,
            headers_received: false,
            framing: None,
            chunks: ChunkDecoder::new(),
            assembler: EventAssembler::new(),
            content_remaining: 0,
            body_bytes_read: 0,
            timed_out: false,
            closed_notified: false,
            buffer: BytesMut::with_capacity(config.read_buffer_capacity),
        }
    }

    /// Consume as much of `buf` as possible.
    ///
    /// Incomplete lines stay in `buf`. A fatal framing error closes the
    /// parser, reports [`Termination::BadResponse`] to the handler and is
    /// returned so the transport can drop the connection. Feeding a closed
    /// parser does nothing.
    pub fn feed(&mut self, buf: &mut BytesMut) -> SseResult<()> {
        if self.status == ParseStatus::Closed {
            return Ok(());
        }

        self.advance(buf).map_err(|err| {
            warn!(error = %err, "fatal response framing error");
            sluice_telemetry::metrics::record_frame_error(err.kind());
            self.on_close(Termination::BadResponse(err.to_string()));
            err
        })
    }

    /// Append `bytes` to the parser's own buffer and feed it.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> SseResult<()> {
        let mut buf = std::mem::take(&mut self.buffer);
        buf.extend_from_slice(bytes);
        let result = self.feed(&mut buf);
        self.buffer = buf;
        result
    }

    /// The transport ended. Only the first call has any effect.
    pub fn on_close(&mut self, result: Termination) {
        self.status = ParseStatus::Closed;

        if self.closed_notified {
            trace!(termination = %result, "ignoring repeated close");
            return;
        }
        self.closed_notified = true;

        debug!(termination = %result, body_bytes = self.body_bytes_read, "connection closed");
        sluice_telemetry::metrics::record_connection_closed(result.label());
        self.handler.on_closed(result, self.head.as_ref());
    }

    fn advance(&mut self, buf: &mut BytesMut) -> SseResult<()> {
        if self.status == ParseStatus::ExpectHeaders {
            self.read_head(buf)?;
        }
        if self.status == ParseStatus::ExpectBody {
            self.read_body(buf)?;
        }
        Ok(())
    }

    fn read_head(&mut self, buf: &mut BytesMut) -> SseResult<()> {
        while let Some((line_end, next)) = find_line(buf) {
            let raw = buf.split_to(next);
            let line = &raw[..line_end];

            match self.head.as_mut() {
                None => self.head = Some(parse_status_line(line)?),
                Some(_) if line.is_empty() => return self.finish_head(),
                Some(head) => push_header(&mut head.headers, line)?,
            }
        }
        Ok(())
    }

    fn finish_head(&mut self) -> SseResult<()> {
        let Some(head) = self.head.as_ref() else {
            return Err(SseError::malformed_status_line(""));
        };

        let framing = select_framing(&head.headers)?;
        debug!(status = head.status.as_u16(), ?framing, "response headers received");

        self.headers_received = true;
        self.framing = Some(framing);
        self.status = ParseStatus::ExpectBody;
        if let BodyFraming::ContentLength(len) = framing {
            self.content_remaining = len;
        }

        self.handler.on_headers(head);
        Ok(())
    }

    fn read_body(&mut self, buf: &mut BytesMut) -> SseResult<()> {
        let Some(framing) = self.framing else {
            return Ok(());
        };

        match framing {
            BodyFraming::Chunked => {
                let suppress = self.timed_out;
                let assembler = &mut self.assembler;
                let handler = &mut self.handler;
                let bytes_read = &mut self.body_bytes_read;

                let progress = self.chunks.decode(buf, |data| {
                    *bytes_read += data.len() as u64;
                    dispatch_body(assembler, handler, suppress, data);
                })?;

                if progress == ChunkProgress::Complete {
                    self.finish_body();
                }
            }
            BodyFraming::ContentLength(_) => {
                let available = buf.len();
                let take = usize::try_from(self.content_remaining)
                    .map_or(available, |remaining| remaining.min(available));
                if take > 0 {
                    let data = buf.split_to(take);
                    self.content_remaining -= take as u64;
                    self.deliver(&data);
                }
                if self.content_remaining == 0 {
                    self.finish_body();
                }
            }
            BodyFraming::UntilClose => {
                if !buf.is_empty() {
                    let data = buf.split();
                    self.deliver(&data);
                }
            }
        }
        Ok(())
    }

    fn deliver(&mut self, data: &[u8]) {
        self.body_bytes_read += data.len() as u64;
        dispatch_body(&mut self.assembler, &mut self.handler, self.timed_out, data);
    }

    fn finish_body(&mut self) {
        debug!(body_bytes = self.body_bytes_read, "response body complete");
        self.status = ParseStatus::Closed;
    }
}

impl<H> ResponseFrameParser<H> {
    /// Current parse state.
    pub fn status(&self) -> ParseStatus {
        self.status
    }

    /// The response head read so far.
    ///
    /// Present once the status line is parsed; headers are complete only
    /// when [`headers_received`](Self::headers_received) is true.
    pub fn head(&self) -> Option<&ResponseHead> {
        self.head.as_ref()
    }

    /// True once the blank line ending the headers was read.
    pub fn headers_received(&self) -> bool {
        self.headers_received
    }

    /// Body framing, known once headers are received.
    pub fn body_framing(&self) -> Option<BodyFraming> {
        self.framing
    }

    /// The most recent valid event id on this connection.
    pub fn last_event_id(&self) -> &str {
        self.assembler.last_event_id()
    }

    /// Decoded body bytes passed to the event assembler.
    pub fn body_bytes_read(&self) -> u64 {
        self.body_bytes_read
    }

    /// Stop delivering events. Parsing continues so the connection can
    /// still be closed cleanly.
    pub fn set_timed_out(&mut self) {
        self.timed_out = true;
    }

    /// True after [`set_timed_out`](Self::set_timed_out).
    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    /// Bytes held in the buffer used by [`feed_bytes`](Self::feed_bytes).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// The handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the parser, returning the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }
}

fn dispatch_body<H: SseHandler>(
    assembler: &mut EventAssembler,
    handler: &mut H,
    suppress: bool,
    data: &[u8],
) {
    assembler.feed(data, |event| {
        if suppress {
            trace!("timed out, dropping event");
        } else {
            handler.on_event(event);
        }
    });
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parse `VERSION SP CODE [SP REASON]`.
fn parse_status_line(line: &[u8]) -> SseResult<ResponseHead> {
    let Some(space) = memchr::memchr(b' ', line) else {
        return Err(SseError::malformed_status_line(lossy(line)));
    };

    let version_token = &line[..space];
    let version = match version_token.last() {
        Some(b'1') => Version::HTTP_11,
        Some(b'0') => Version::HTTP_10,
        _ => return Err(SseError::UnsupportedVersion(lossy(version_token))),
    };

    let rest = &line[space + 1..];
    let code = match memchr::memchr(b' ', rest) {
        Some(end) => &rest[..end],
        None => rest,
    };
    let status = StatusCode::from_bytes(code)
        .map_err(|_| SseError::malformed_status_line(lossy(line)))?;

    trace!(?version, status = status.as_u16(), "status line");
    Ok(ResponseHead {
        version,
        status,
        headers: HeaderMap::new(),
    })
}

/// Append one `name:[ ]value` line. Unusable lines are skipped.
fn push_header(headers: &mut HeaderMap, line: &[u8]) -> SseResult<()> {
    let Some(colon) = memchr::memchr(b':', line) else {
        debug!(line = %lossy(line), "skipping header line without colon");
        return Ok(());
    };

    let value = &line[colon + 1..];
    let value = value.strip_prefix(b" ").unwrap_or(value);

    let name = match HeaderName::from_bytes(&line[..colon]) {
        Ok(name) => name,
        Err(_) => {
            debug!(line = %lossy(line), "skipping header with invalid name");
            return Ok(());
        }
    };
    let value = match HeaderValue::from_bytes(value) {
        Ok(value) => value,
        Err(_) => {
            debug!(header = %name, "skipping header with invalid value");
            return Ok(());
        }
    };

    headers
        .try_append(name, value)
        .map_err(|_| SseError::TooManyHeaders)?;
    Ok(())
}

fn select_framing(headers: &HeaderMap) -> SseResult<BodyFraming> {
    let chunked = headers.get_all(TRANSFER_ENCODING).iter().any(|value| {
        value.as_bytes().split(|b| *b == b',').any(|coding| {
            trim_ows(coding).eq_ignore_ascii_case(b"chunked")
        })
    });
    if chunked {
        return Ok(BodyFraming::Chunked);
    }

    match headers.get(CONTENT_LENGTH) {
        Some(value) => {
            let text = trim_ows(value.as_bytes());
            if text.is_empty() || !text.iter().all(u8::is_ascii_digit) {
                return Err(SseError::invalid_content_length(lossy(value.as_bytes())));
            }
            std::str::from_utf8(text)
                .ok()
                .and_then(|digits| digits.parse().ok())
                .map(BodyFraming::ContentLength)
                .ok_or_else(|| SseError::invalid_content_length(lossy(value.as_bytes())))
        }
        None => Ok(BodyFraming::UntilClose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        heads: Vec<ResponseHead>,
        events: Vec<SseEvent>,
        closed: Vec<(Termination, Option<ResponseHead>)>,
    }

    impl SseHandler for Recorder {
        fn on_event(&mut self, event: SseEvent) {
            self.events.push(event);
        }

        fn on_headers(&mut self, head: &ResponseHead) {
            self.heads.push(head.clone());
        }

        fn on_closed(&mut self, result: Termination, head: Option<&ResponseHead>) {
            self.closed.push((result, head.cloned()));
        }
    }

    fn parser() -> ResponseFrameParser<Recorder> {
        ResponseFrameParser::new(Recorder::default())
    }

    fn feed_all(parser: &mut ResponseFrameParser<Recorder>, input: &[u8]) -> SseResult<()> {
        let mut buf = BytesMut::from(input);
        parser.feed(&mut buf)
    }

    #[test]
    fn test_chunked_response() {
        let mut parser = parser();
        feed_all(
            &mut parser,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\n\r\n\
              c\r\ndata:Hello\n\n\r\n0\r\n\r\n",
        )
        .unwrap();

        assert_eq!(parser.status(), ParseStatus::Closed);
        assert_eq!(parser.body_framing(), Some(BodyFraming::Chunked));
        assert_eq!(parser.body_bytes_read(), 12);

        let recorder = parser.handler();
        assert_eq!(recorder.heads.len(), 1);
        assert_eq!(recorder.heads[0].status, StatusCode::OK);
        assert_eq!(recorder.heads[0].version, Version::HTTP_11);
        assert_eq!(recorder.events.len(), 1);
        assert_eq!(recorder.events[0].data, "Hello");
        // Closing is left to the transport.
        assert!(recorder.closed.is_empty());
    }

    #[test]
    fn test_headers_lowercased_and_appended() {
        let mut parser = parser();
        feed_all(
            &mut parser,
            b"HTTP/1.0 200 OK\r\nX-Tag:  a\r\nx-tag: b\r\nBroken line\r\n\r\n",
        )
        .unwrap();

        let head = parser.head().unwrap();
        assert_eq!(head.version, Version::HTTP_10);
        let tags: Vec<_> = head
            .headers
            .get_all("x-tag")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(tags, [" a", "b"]);
        assert_eq!(head.headers.len(), 2);
    }

    #[test]
    fn test_header_phase_waits_for_complete_lines() {
        let mut parser = parser();
        let mut buf = BytesMut::from(&b"HTTP/1.1 20"[..]);
        parser.feed(&mut buf).unwrap();
        assert_eq!(&buf[..], b"HTTP/1.1 20");
        assert!(parser.head().is_none());

        buf.extend_from_slice(b"0 OK\r\nContent-Len");
        parser.feed(&mut buf).unwrap();
        assert_eq!(parser.head().unwrap().status, StatusCode::OK);
        assert!(!parser.headers_received());

        buf.extend_from_slice(b"gth: 4\r\n\r\n");
        parser.feed(&mut buf).unwrap();
        assert!(parser.headers_received());
        assert_eq!(parser.status(), ParseStatus::ExpectBody);
        assert_eq!(parser.body_framing(), Some(BodyFraming::ContentLength(4)));
    }

    #[test]
    fn test_chunked_takes_precedence() {
        let mut parser = parser();
        feed_all(
            &mut parser,
            b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\nTransfer-Encoding: gzip, Chunked\r\n\r\n",
        )
        .unwrap();
        assert_eq!(parser.body_framing(), Some(BodyFraming::Chunked));
    }

    #[test]
    fn test_content_length_body() {
        let mut parser = parser();
        let mut buf = BytesMut::from(
            &b"HTTP/1.1 200 OK\r\nContent-Length: 17\r\n\r\ndata: one\n\nextra"[..],
        );
        parser.feed(&mut buf).unwrap();
        assert_eq!(parser.status(), ParseStatus::ExpectBody);
        assert_eq!(parser.handler().events.len(), 1);
        assert!(buf.is_empty());

        buf.extend_from_slice(b"\nSURPLUS");
        parser.feed(&mut buf).unwrap();
        assert_eq!(parser.status(), ParseStatus::Closed);
        assert_eq!(parser.body_bytes_read(), 17);
        assert_eq!(&buf[..], b"SURPLUS");
    }

    #[test]
    fn test_zero_content_length_completes() {
        let mut parser = parser();
        feed_all(&mut parser, b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n").unwrap();
        assert_eq!(parser.status(), ParseStatus::Closed);
        assert_eq!(parser.handler().heads.len(), 1);
    }

    #[test]
    fn test_until_close_body() {
        let mut parser = parser();
        feed_all(&mut parser, b"HTTP/1.1 200 OK\r\n\r\ndata: a\n\ndata: b\n").unwrap();
        assert_eq!(parser.body_framing(), Some(BodyFraming::UntilClose));
        assert_eq!(parser.status(), ParseStatus::ExpectBody);
        assert_eq!(parser.handler().events.len(), 1);

        parser.on_close(Termination::Completed);
        assert_eq!(parser.status(), ParseStatus::Closed);
        let recorder = parser.into_handler();
        assert_eq!(recorder.closed.len(), 1);
        assert_eq!(recorder.closed[0].0, Termination::Completed);
        assert_eq!(recorder.closed[0].1.as_ref().map(|h| h.status), Some(StatusCode::OK));
    }

    #[test]
    fn test_status_line_without_reason() {
        let mut parser = parser();
        feed_all(&mut parser, b"HTTP/1.1 503\r\n\r\n").unwrap();
        assert_eq!(
            parser.head().unwrap().status,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_malformed_status_line_closes_once() {
        let mut parser = parser();
        let err = feed_all(&mut parser, b"garbage\r\n").unwrap_err();
        assert!(matches!(err, SseError::MalformedStatusLine(_)));
        assert_eq!(parser.status(), ParseStatus::Closed);

        parser.on_close(Termination::Aborted);
        feed_all(&mut parser, b"HTTP/1.1 200 OK\r\n\r\n").unwrap();

        let closed = &parser.handler().closed;
        assert_eq!(closed.len(), 1);
        assert!(matches!(closed[0].0, Termination::BadResponse(_)));
        assert!(closed[0].1.is_none());
    }

    #[test]
    fn test_invalid_status_code() {
        let mut parser = parser();
        let err = feed_all(&mut parser, b"HTTP/1.1 abc OK\r\n").unwrap_err();
        assert!(matches!(err, SseError::MalformedStatusLine(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut parser = parser();
        let err = feed_all(&mut parser, b"HTTP/2 200\r\n").unwrap_err();
        assert!(matches!(err, SseError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_invalid_content_length() {
        let mut parser = parser();
        let err = feed_all(&mut parser, b"HTTP/1.1 200 OK\r\nContent-Length: ten\r\n\r\n")
            .unwrap_err();
        assert!(matches!(err, SseError::InvalidContentLength(_)));

        let closed = &parser.handler().closed;
        assert_eq!(closed.len(), 1);
        // The partial head is reported with the failure.
        assert_eq!(closed[0].1.as_ref().map(|h| h.status), Some(StatusCode::OK));
    }

    #[test]
    fn test_bad_chunk_size_reported() {
        let mut parser = parser();
        let err = feed_all(
            &mut parser,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nxyz\r\n",
        )
        .unwrap_err();
        assert!(matches!(err, SseError::InvalidChunkSize(_)));
        assert_eq!(parser.handler().closed.len(), 1);
    }

    #[test]
    fn test_timed_out_suppresses_events() {
        let mut parser = parser();
        feed_all(&mut parser, b"HTTP/1.1 200 OK\r\n\r\nid: 1\ndata: a\n\n").unwrap();
        parser.set_timed_out();
        feed_all(&mut parser, b"id: 2\ndata: b\n\n").unwrap();
        parser.on_close(Termination::Timeout);

        assert!(parser.is_timed_out());
        assert_eq!(parser.handler().events.len(), 1);
        assert_eq!(parser.last_event_id(), "2");
        assert_eq!(parser.handler().closed[0].0, Termination::Timeout);
    }

    #[test]
    fn test_feed_bytes_uses_internal_buffer() {
        let mut partial = parser();
        partial.feed_bytes(b"HTTP/1.1 2").unwrap();
        assert_eq!(partial.buffered_len(), 10);

        let mut parser = parser();
        parser.feed_bytes(b"HTTP/1.1 200 OK\r\n\r\nda").unwrap();
        assert_eq!(parser.buffered_len(), 0);
        parser.feed_bytes(b"ta: x\n\n").unwrap();
        assert_eq!(parser.handler().events[0].data, "x");
    }

    #[test]
    fn test_closure_handler() {
        let mut seen = Vec::new();
        let mut parser = ResponseFrameParser::new(|event: SseEvent| seen.push(event.data));
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\n\r\ndata: z\n\n"[..]);
        parser.feed(&mut buf).unwrap();
        parser.on_close(Termination::Completed);
        drop(parser);
        assert_eq!(seen, ["z"]);
    }

    #[tokio::test]
    async fn test_channel_handler() {
        let (handler, mut rx) = ChannelHandler::new();
        let mut parser = ResponseFrameParser::new(handler);
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\n\r\ndata: q\n\n"[..]);
        parser.feed(&mut buf).unwrap();
        parser.on_close(Termination::NetworkFailure("reset".into()));

        assert!(matches!(rx.recv().await, Some(ClientMessage::Headers(_))));
        assert_eq!(
            rx.recv().await,
            Some(ClientMessage::Event(SseEvent::typed("message", "q")))
        );
        match rx.recv().await {
            Some(ClientMessage::Closed { result, head }) => {
                assert_eq!(result.to_string(), "network_failure: reset");
                assert!(head.is_some());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_header_flood_closes_with_bad_response() {
        let mut raw = b"HTTP/1.1 200 OK\r\n".to_vec();
        for i in 0..40_000 {
            raw.extend_from_slice(format!("x{i}: y\r\n").as_bytes());
        }
        raw.extend_from_slice(b"\r\n");

        let mut parser = parser();
        let err = feed_all(&mut parser, &raw).unwrap_err();
        assert!(matches!(err, SseError::TooManyHeaders));
        assert_eq!(parser.status(), ParseStatus::Closed);

        let recorder = parser.handler();
        assert!(recorder.heads.is_empty());
        assert_eq!(recorder.closed.len(), 1);
        assert!(matches!(recorder.closed[0].0, Termination::BadResponse(_)));
    }

    #[test]
    fn test_termination_labels() {
        assert!(Termination::Completed.is_success());
        assert!(!Termination::Aborted.is_success());
        assert_eq!(Termination::Timeout.to_string(), "timeout");
        assert_eq!(Termination::BadResponse("x".into()).label(), "bad_response");
    }
}
