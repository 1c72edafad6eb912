//! Fragmentation invariance.
//!
//! However an event stream is split across deliveries, the dispatched events
//! must equal those from a single delivery of the whole stream.

use proptest::prelude::*;
use sluice_sse::{EventAssembler, ResponseFrameParser, SseEvent, Termination};
use sluice_test::{
    byte_by_byte, chunked_encode, feed_fragments, http_response, split_at_points,
    RecordingHandler,
};

fn sse_line() -> impl Strategy<Value = String> {
    let text = "[a-z0-9 :]{0,12}";
    prop_oneof![
        3 => text.prop_map(|t| format!("data: {t}")),
        1 => "[a-z]{0,6}".prop_map(|t| format!("event: {t}")),
        1 => "[a-z0-9]{0,4}".prop_map(|t| format!("id: {t}")),
        1 => "[0-9a-z]{0,5}".prop_map(|t| format!("retry: {t}")),
        1 => text.prop_map(|t| format!(":{t}")),
        1 => "[a-z]{1,5}".prop_map(|f| format!("{f}: x")),
        2 => Just(String::new()),
    ]
}

fn sse_stream() -> impl Strategy<Value = Vec<u8>> {
    (prop::collection::vec(sse_line(), 0..40), any::<bool>()).prop_map(|(lines, crlf)| {
        let terminator = if crlf { "\r\n" } else { "\n" };
        let mut out = String::new();
        for line in lines {
            out.push_str(&line);
            out.push_str(terminator);
        }
        out.into_bytes()
    })
}

fn assemble_whole(input: &[u8]) -> (Vec<SseEvent>, String) {
    let mut assembler = EventAssembler::new();
    let events = assembler.feed_events(input);
    (events, assembler.last_event_id().to_string())
}

proptest! {
    #[test]
    fn assembler_ignores_split_points(
        input in sse_stream(),
        points in prop::collection::vec(0usize..2048, 0..16),
    ) {
        let (expected, expected_id) = assemble_whole(&input);

        let mut assembler = EventAssembler::new();
        let mut events = Vec::new();
        for piece in split_at_points(&input, &points) {
            assembler.feed(&piece, |event| events.push(event));
        }

        prop_assert_eq!(events, expected);
        prop_assert_eq!(assembler.last_event_id(), expected_id.as_str());
    }

    #[test]
    fn chunked_response_ignores_split_points(
        input in sse_stream(),
        chunk_size in 1usize..32,
        points in prop::collection::vec(0usize..4096, 0..16),
    ) {
        let (expected, _) = assemble_whole(&input);
        let raw = http_response(
            200,
            &[("Content-Type", "text/event-stream"), ("Transfer-Encoding", "chunked")],
            &chunked_encode(&input, chunk_size),
        );

        let handler = RecordingHandler::new();
        let recorded = handler.recorded();
        let mut parser = ResponseFrameParser::new(handler);
        feed_fragments(&mut parser, split_at_points(&raw, &points)).unwrap();
        parser.on_close(Termination::Completed);

        prop_assert_eq!(recorded.events(), expected);
        prop_assert_eq!(recorded.close_count(), 1);
    }

    #[test]
    fn writer_output_round_trips(
        event_type in "[a-z]{0,6}",
        data in "[a-z][a-z ]{0,7}(\n([a-z][a-z ]{0,7})?){0,3}",
        id in "[a-z0-9]{0,4}",
        retry_ms in 0u64..100_000,
    ) {
        let event = SseEvent::typed(event_type.clone(), data).id(id).retry_ms(retry_ms);
        let events = EventAssembler::new().feed_events(&event.to_bytes());

        let mut expected = event;
        if event_type.is_empty() {
            expected.event_type = "message".to_string();
        }
        prop_assert_eq!(events, vec![expected]);
    }
}

#[test]
fn byte_by_byte_matches_whole() {
    let input = b"event: greet\r\nid: 1\r\ndata: hi\r\n\r\n: ping\n\ndata: a\ndata: b\n\n";
    let (expected, _) = assemble_whole(input);

    let mut assembler = EventAssembler::new();
    let mut events = Vec::new();
    for piece in byte_by_byte(input) {
        assembler.feed(&piece, |event| events.push(event));
    }

    assert_eq!(events.len(), 2);
    assert_eq!(events, expected);
    assert_eq!(events[1].data, "a\nb");
}
