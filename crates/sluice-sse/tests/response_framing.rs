//! Response framing integration tests.

use bytes::BytesMut;
use http::{StatusCode, Version};
use sluice_sse::{BodyFraming, ParseStatus, ResponseFrameParser, SseError, Termination};
use sluice_test::{byte_by_byte, feed_fragments, http_response, RecordingHandler};

fn parser() -> (ResponseFrameParser<RecordingHandler>, sluice_test::Recorded) {
    let handler = RecordingHandler::new();
    let recorded = handler.recorded();
    (ResponseFrameParser::new(handler), recorded)
}

#[test]
fn chunked_hello_dispatches_once_then_closes() {
    let (mut parser, recorded) = parser();
    let raw = http_response(
        200,
        &[("Transfer-Encoding", "chunked")],
        b"5\r\ndata:\r\n7\r\nHello\n\n\r\n0\r\n\r\n",
    );

    feed_fragments(&mut parser, [raw]).unwrap();
    assert_eq!(parser.status(), ParseStatus::Closed);
    assert_eq!(recorded.event_data(), ["Hello"]);

    // Bytes after the terminal chunk produce nothing.
    feed_fragments(&mut parser, [b"data: late\n\n"]).unwrap();
    assert_eq!(recorded.events().len(), 1);

    parser.on_close(Termination::Completed);
    recorded.assert_closed_once();
    assert_eq!(recorded.termination(), Some(Termination::Completed));
}

#[test]
fn chunk_body_spec_scenario() {
    let (mut parser, recorded) = parser();
    let raw = http_response(200, &[("Transfer-Encoding", "chunked")], b"5\r\nHello\r\n0\r\n\r\n");

    feed_fragments(&mut parser, byte_by_byte(&raw)).unwrap();

    assert_eq!(parser.status(), ParseStatus::Closed);
    assert_eq!(parser.body_bytes_read(), 5);
    // "Hello" is never terminated by a blank line, so nothing dispatches.
    assert!(recorded.events().is_empty());

    let heads = recorded.heads();
    assert_eq!(heads.len(), 1);
    assert_eq!(heads[0].status, StatusCode::OK);
    assert_eq!(heads[0].version, Version::HTTP_11);
    assert_eq!(heads[0].headers["transfer-encoding"], "chunked");
}

#[test]
fn parse_error_then_explicit_close_notifies_once() {
    let (mut parser, recorded) = parser();
    let raw = http_response(200, &[("Transfer-Encoding", "chunked")], b"not-hex\r\n");

    let err = feed_fragments(&mut parser, [raw]).unwrap_err();
    assert!(matches!(err, SseError::InvalidChunkSize(_)));
    assert!(err.is_fatal());

    parser.on_close(Termination::NetworkFailure("reset by peer".into()));
    parser.on_close(Termination::Aborted);

    recorded.assert_closed_once();
    match recorded.termination() {
        Some(Termination::BadResponse(reason)) => assert!(reason.contains("not-hex")),
        other => panic!("unexpected termination: {other:?}"),
    }
}

#[test]
fn close_before_headers_reports_no_head() {
    let (mut parser, recorded) = parser();
    feed_fragments(&mut parser, [b"HTTP/1.1 2"]).unwrap();
    parser.on_close(Termination::Timeout);

    let recording = recorded.snapshot();
    assert!(recording.heads.is_empty());
    assert_eq!(recording.closed, vec![(Termination::Timeout, None)]);
}

#[test]
fn close_mid_headers_reports_partial_head() {
    let (mut parser, recorded) = parser();
    feed_fragments(&mut parser, [b"HTTP/1.1 404 Not Found\r\nX-A: 1\r\n"]).unwrap();
    assert!(!parser.headers_received());
    parser.on_close(Termination::Aborted);

    let recording = recorded.snapshot();
    assert!(recording.heads.is_empty());
    let head = recording.closed[0].1.as_ref().unwrap();
    assert_eq!(head.status, StatusCode::NOT_FOUND);
    assert_eq!(head.headers["x-a"], "1");
}

#[test]
fn content_length_body_across_fragments() {
    let (mut parser, recorded) = parser();
    let body = b"id: 7\ndata: one\n\ndata: two\n\n";
    let raw = http_response(200, &[("Content-Length", &body.len().to_string())], body);

    feed_fragments(&mut parser, byte_by_byte(&raw)).unwrap();

    assert_eq!(
        parser.body_framing(),
        Some(BodyFraming::ContentLength(body.len() as u64))
    );
    assert_eq!(parser.status(), ParseStatus::Closed);
    assert_eq!(recorded.event_data(), ["one", "two"]);
    assert_eq!(parser.last_event_id(), "7");
}

#[test]
fn close_delimited_body_ends_on_close() {
    let (mut parser, recorded) = parser();
    let raw = http_response(200, &[("Content-Type", "text/event-stream")], b"data: a\n\ndata: partial");

    feed_fragments(&mut parser, [raw]).unwrap();
    assert_eq!(parser.body_framing(), Some(BodyFraming::UntilClose));
    assert_eq!(parser.status(), ParseStatus::ExpectBody);

    parser.on_close(Termination::Completed);
    assert_eq!(parser.status(), ParseStatus::Closed);
    assert_eq!(recorded.event_data(), ["a"]);
    recorded.assert_closed_once();
}

#[test]
fn feed_after_close_is_ignored() {
    let (mut parser, recorded) = parser();
    parser.on_close(Termination::Aborted);

    let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\n\r\ndata: x\n\n"[..]);
    parser.feed(&mut buf).unwrap();

    assert!(recorded.heads().is_empty());
    assert!(recorded.events().is_empty());
    recorded.assert_closed_once();
}

#[test]
fn timeout_suppresses_remaining_events() {
    let (mut parser, recorded) = parser();
    feed_fragments(&mut parser, [http_response(200, &[], b"data: before\n\n")]).unwrap();

    parser.set_timed_out();
    feed_fragments(&mut parser, [b"data: after\n\n"]).unwrap();
    parser.on_close(Termination::Timeout);

    assert_eq!(recorded.event_data(), ["before"]);
    assert_eq!(recorded.termination(), Some(Termination::Timeout));
}
