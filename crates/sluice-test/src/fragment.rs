//! Building and splitting wire input.

use std::fmt::Write as _;

use bytes::BytesMut;
use sluice_sse::{ResponseFrameParser, SseHandler, SseResult};

/// Split `input` at the given offsets.
///
/// Offsets are sorted, deduplicated and clamped to the input length; empty
/// pieces are dropped. Concatenating the result always yields `input`.
#[must_use]
pub fn split_at_points(input: &[u8], points: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = points.iter().map(|&p| p.min(input.len())).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(input.len())) {
        if cut > start {
            pieces.push(input[start..cut].to_vec());
            start = cut;
        }
    }
    pieces
}

/// Split `input` into single bytes.
#[must_use]
pub fn byte_by_byte(input: &[u8]) -> Vec<Vec<u8>> {
    input.iter().map(|&b| vec![b]).collect()
}

/// Encode `body` with chunked transfer-encoding, at most `chunk_size` bytes
/// per chunk, followed by the terminal chunk.
#[must_use]
pub fn chunked_encode(body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 16);
    for chunk in body.chunks(chunk_size.max(1)) {
        out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// Raw HTTP/1.1 response bytes: status line, headers, blank line, body.
#[must_use]
pub fn http_response(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let reason = http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");

    let mut head = format!("HTTP/1.1 {status} {reason}\r\n");
    for (name, value) in headers {
        let _ = write!(head, "{name}: {value}\r\n");
    }
    head.push_str("\r\n");

    let mut out = head.into_bytes();
    out.extend_from_slice(body);
    out
}

/// Feed `fragments` one at a time through a single buffer.
pub fn feed_fragments<H, I, F>(parser: &mut ResponseFrameParser<H>, fragments: I) -> SseResult<()>
where
    H: SseHandler,
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut buf = BytesMut::new();
    for fragment in fragments {
        buf.extend_from_slice(fragment.as_ref());
        parser.feed(&mut buf)?;
    }
    Ok(())
}
