//! Line-oriented event reassembly.
//!
//! [`EventAssembler`] turns an `text/event-stream` body, delivered in
//! arbitrary fragments, into dispatched [`SseEvent`]s. Only complete lines
//! are interpreted; a trailing partial line is retained until the next
//! [`feed`](EventAssembler::feed).
//!
//! Per line, in order:
//!
//! 1. empty line: dispatch the accumulated event if its data is non-empty
//! 2. leading `:`: comment, ignored
//! 3. `name[:[ ]value]`: `event`, `data`, `id` and `retry` update the
//!    accumulator, anything else is ignored

use bytes::BytesMut;
use tracing::trace;

use crate::event::{SseEvent, DEFAULT_EVENT_TYPE};
use crate::line::find_line;

/// Reassembles SSE events from a fragmented byte stream.
///
/// # Example
///
/// ```
/// use sluice_sse::EventAssembler;
///
/// let mut assembler = EventAssembler::new();
/// assert!(assembler.feed_events(b"event: greet\nid: 1\nda").is_empty());
///
/// let events = assembler.feed_events(b"ta: hi\n\n");
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].event_type, "greet");
/// assert_eq!(events[0].data, "hi");
/// assert_eq!(assembler.last_event_id(), "1");
/// ```
#[derive(Debug, Default)]
pub struct EventAssembler {
    /// Bytes of the current, not yet terminated line.
    line: BytesMut,
    /// Event being accumulated.
    current: SseEvent,
    /// Last accepted `id` on this connection.
    last_event_id: String,
}

impl EventAssembler {
    /// Create an assembler with an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `bytes`, invoking `on_event` for every dispatched event in
    /// arrival order before returning.
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_event: F)
    where
        F: FnMut(SseEvent),
    {
        // Retained bytes hold no LF; only the last one can be a CR to strip.
        let mut start = self.line.len().saturating_sub(1);
        self.line.extend_from_slice(bytes);

        while let Some((end, next)) = find_line(&self.line[start..]) {
            let raw = self.line.split_to(start + next);
            self.process_line(&raw[..start + end], &mut on_event);
            start = 0;
        }
    }

    /// Consume `bytes` and collect the dispatched events.
    pub fn feed_events(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        self.feed(bytes, |event| events.push(event));
        events
    }

    /// The most recent valid `id` seen on this stream, empty if none.
    pub fn last_event_id(&self) -> &str {
        &self.last_event_id
    }

    /// Number of bytes retained from an unterminated line.
    pub fn pending_len(&self) -> usize {
        self.line.len()
    }

    /// Discard the partial line and the accumulated event.
    ///
    /// The last event id survives a reset.
    pub fn reset(&mut self) {
        self.line.clear();
        self.current = SseEvent::default();
    }

    fn process_line<F>(&mut self, line: &[u8], on_event: &mut F)
    where
        F: FnMut(SseEvent),
    {
        if line.is_empty() {
            self.dispatch(on_event);
            return;
        }

        if line[0] == b':' {
            return;
        }

        let (field, value) = split_field(line);

        match field {
            b"event" => {
                self.current.event_type = decode(value);
            }
            b"data" => {
                let value = String::from_utf8_lossy(value);
                if self.current.data.is_empty() {
                    self.current.data = value.into_owned();
                } else {
                    self.current.data.push('\n');
                    self.current.data.push_str(&value);
                }
            }
            b"id" => {
                if memchr::memchr(0, value).is_none() {
                    let id = decode(value);
                    self.last_event_id.clone_from(&id);
                    self.current.id = id;
                } else {
                    trace!("dropping id containing NUL");
                }
            }
            b"retry" => match parse_retry(value) {
                Some(ms) => self.current.retry_ms = ms,
                None => trace!("dropping non-numeric retry value"),
            },
            _ => {
                trace!(field = %String::from_utf8_lossy(field), "ignoring unknown field");
            }
        }
    }

    fn dispatch<F>(&mut self, on_event: &mut F)
    where
        F: FnMut(SseEvent),
    {
        let mut event = std::mem::take(&mut self.current);

        if !event.is_valid() {
            trace!("discarding event without data");
            return;
        }

        if event.event_type.is_empty() {
            event.event_type = DEFAULT_EVENT_TYPE.to_string();
        }

        sluice_telemetry::metrics::record_event_dispatched();
        on_event(event);
    }
}

/// Split a field line on the first colon, skipping one leading space of the value.
fn split_field(line: &[u8]) -> (&[u8], &[u8]) {
    match memchr::memchr(b':', line) {
        Some(colon) => {
            let value = &line[colon + 1..];
            let value = match value {
                [b' ', rest @ ..] => rest,
                _ => value,
            };
            (&line[..colon], value)
        }
        None => (line, &[][..]),
    }
}

fn decode(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

fn parse_retry(value: &[u8]) -> Option<u64> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // Digits only, so this is valid UTF-8; overflow drops the value.
    std::str::from_utf8(value).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(input: &[u8]) -> Vec<SseEvent> {
        EventAssembler::new().feed_events(input)
    }

    #[test]
    fn test_full_event() {
        let events = assemble(b"event: greet\nid: 1\ndata: hi\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event_type: "greet".to_string(),
                data: "hi".to_string(),
                id: "1".to_string(),
                retry_ms: 0,
            }]
        );
    }

    #[test]
    fn test_default_event_type() {
        let events = assemble(b"data: plain\n\n");
        assert_eq!(events[0].event_type, "message");
    }

    #[test]
    fn test_data_lines_concatenate() {
        let events = assemble(b"data:a\ndata:b\n\n");
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn test_empty_data_line_does_not_prefix_newline() {
        let events = assemble(b"data:\ndata:x\n\n");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_event_without_data_is_not_dispatched() {
        let mut assembler = EventAssembler::new();
        let events = assembler.feed_events(b"event: ping\nid: 5\n\ndata: next\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "message");
        assert_eq!(events[0].id, "");
        assert_eq!(events[0].data, "next");
        // The id line of the discarded event still updated the stream id.
        assert_eq!(assembler.last_event_id(), "5");
    }

    #[test]
    fn test_comments_ignored() {
        let events = assemble(b": keepalive\n:\ndata: x\n: mid\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_only_one_leading_space_stripped() {
        let events = assemble(b"data:  two\n\n");
        assert_eq!(events[0].data, " two");
    }

    #[test]
    fn test_field_without_colon() {
        let events = assemble(b"data\ndata: x\n\n");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_value_may_contain_colons() {
        let events = assemble(b"data: a:b: c\n\n");
        assert_eq!(events[0].data, "a:b: c");
    }

    #[test]
    fn test_last_event_type_wins() {
        let events = assemble(b"event: a\nevent: b\ndata: x\n\n");
        assert_eq!(events[0].event_type, "b");
    }

    #[test]
    fn test_id_with_nul_is_dropped() {
        let mut assembler = EventAssembler::new();
        let events = assembler.feed_events(b"id: good\nid: b\0ad\ndata: x\n\n");
        assert_eq!(events[0].id, "good");
        assert_eq!(assembler.last_event_id(), "good");
    }

    #[test]
    fn test_retry_validation() {
        let events = assemble(b"retry: 3000\ndata: x\n\n");
        assert_eq!(events[0].retry_ms, 3000);

        let events = assemble(b"retry: 30s\ndata: x\n\n");
        assert_eq!(events[0].retry_ms, 0);

        let events = assemble(b"retry: 100\nretry: -1\nretry:\ndata: x\n\n");
        assert_eq!(events[0].retry_ms, 100);

        let events = assemble(b"retry: 99999999999999999999999\ndata: x\n\n");
        assert_eq!(events[0].retry_ms, 0);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let events = assemble(b"foo: bar\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_crlf_terminators() {
        let events = assemble(b"event: a\r\ndata: x\r\n\r\n");
        assert_eq!(events[0].event_type, "a");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_partial_line_retained() {
        let mut assembler = EventAssembler::new();
        assert!(assembler.feed_events(b"data: hel").is_empty());
        assert_eq!(assembler.pending_len(), 9);
        assert!(assembler.feed_events(b"lo\n").is_empty());
        assert_eq!(assembler.pending_len(), 0);
        let events = assembler.feed_events(b"\n");
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn test_crlf_split_across_feeds() {
        let mut assembler = EventAssembler::new();
        assert!(assembler.feed_events(b"data: x\r").is_empty());
        assert!(assembler.feed_events(b"\n\r").is_empty());
        let events = assembler.feed_events(b"\n");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_multiple_events_in_order() {
        let events = assemble(b"data: 1\n\ndata: 2\n\ndata: 3\n\n");
        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, ["1", "2", "3"]);
    }

    #[test]
    fn test_fields_do_not_leak_between_events() {
        let events = assemble(b"event: a\nid: 1\nretry: 5\ndata: x\n\ndata: y\n\n");
        assert_eq!(events[1].event_type, "message");
        assert_eq!(events[1].id, "");
        assert_eq!(events[1].retry_ms, 0);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let events = assemble(b"data: \xff\n\n");
        assert_eq!(events[0].data, "\u{fffd}");
    }

    #[test]
    fn test_reset_keeps_last_event_id() {
        let mut assembler = EventAssembler::new();
        assembler.feed_events(b"id: 42\ndata: partial\nda");
        assembler.reset();
        assert_eq!(assembler.pending_len(), 0);
        assert_eq!(assembler.last_event_id(), "42");
        let events = assembler.feed_events(b"data: fresh\n\n");
        assert_eq!(events[0].data, "fresh");
        assert_eq!(events[0].id, "");
    }
}
