//! HTTP/1.1 chunked transfer-encoding decoder.
//!
//! ```text
//! chunk      = HEXSIZE [ ";" ext ] CRLF  data  CRLF
//! last-chunk = "0" [ ";" ext ] CRLF  *( trailer CRLF )  CRLF
//! ```
//!
//! Chunk data is forwarded to the sink as soon as it is buffered; a chunk
//! spanning several deliveries is never accumulated.

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::error::{SseError, SseResult};
use crate::line::{find_line, trim_ows};

/// What the decoder is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// A chunk-size line.
    ExpectChunkSize,
    /// Chunk data, or the line terminator that follows it once
    /// [`ChunkDecoder::remaining`] reaches zero.
    ExpectChunkData,
}

/// Outcome of a [`ChunkDecoder::decode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkProgress {
    /// Everything buffered was consumed; more bytes are needed.
    NeedMore,
    /// The terminal zero-size chunk was read.
    Complete,
}

/// Incremental decoder for a chunked message body.
#[derive(Debug)]
pub struct ChunkDecoder {
    state: ChunkState,
    remaining: usize,
    complete: bool,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkDecoder {
    /// Create a decoder expecting the first chunk-size line.
    pub fn new() -> Self {
        Self {
            state: ChunkState::ExpectChunkSize,
            remaining: 0,
            complete: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Bytes of the current chunk not yet forwarded.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// True once the terminal chunk has been read.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Decode as much of `buf` as possible, passing body bytes to `sink`.
    ///
    /// Consumed bytes are removed from `buf`. An incomplete size line or
    /// terminator is left in place for the next call.
    pub fn decode<F>(&mut self, buf: &mut BytesMut, mut sink: F) -> SseResult<ChunkProgress>
    where
        F: FnMut(&[u8]),
    {
        loop {
            if self.complete {
                return Ok(ChunkProgress::Complete);
            }

            match self.state {
                ChunkState::ExpectChunkSize => {
                    let Some((line_end, next)) = find_line(buf) else {
                        return Ok(ChunkProgress::NeedMore);
                    };
                    let size = parse_chunk_size(&buf[..line_end])?;
                    buf.advance(next);
                    trace!(size, "chunk header");

                    if size == 0 {
                        consume_trailers(buf);
                        self.complete = true;
                        return Ok(ChunkProgress::Complete);
                    }

                    self.remaining = size;
                    self.state = ChunkState::ExpectChunkData;
                }
                ChunkState::ExpectChunkData if self.remaining > 0 => {
                    if buf.is_empty() {
                        return Ok(ChunkProgress::NeedMore);
                    }
                    let take = self.remaining.min(buf.len());
                    let data = buf.split_to(take);
                    sink(&data);
                    self.remaining -= take;
                }
                ChunkState::ExpectChunkData => match buf.first() {
                    None => return Ok(ChunkProgress::NeedMore),
                    Some(b'\n') => {
                        buf.advance(1);
                        self.state = ChunkState::ExpectChunkSize;
                    }
                    Some(b'\r') => match buf.get(1) {
                        None => return Ok(ChunkProgress::NeedMore),
                        Some(b'\n') => {
                            buf.advance(2);
                            self.state = ChunkState::ExpectChunkSize;
                        }
                        Some(_) => return Err(SseError::InvalidChunkTerminator),
                    },
                    Some(_) => return Err(SseError::InvalidChunkTerminator),
                },
            }
        }
    }
}

/// Parse the hexadecimal size of a chunk-size line, ignoring extensions.
fn parse_chunk_size(line: &[u8]) -> SseResult<usize> {
    let token = match memchr::memchr(b';', line) {
        Some(semi) => &line[..semi],
        None => line,
    };
    let token = trim_ows(token);

    let invalid = || SseError::invalid_chunk_size(String::from_utf8_lossy(line).into_owned());

    if token.is_empty() || !token.iter().all(u8::is_ascii_hexdigit) {
        return Err(invalid());
    }

    let digits = std::str::from_utf8(token).map_err(|_| invalid())?;
    usize::from_str_radix(digits, 16).map_err(|_| invalid())
}

/// Consume buffered trailer lines up to and including the blank line.
fn consume_trailers(buf: &mut BytesMut) {
    while let Some((line_end, next)) = find_line(buf) {
        buf.advance(next);
        if line_end == 0 {
            break;
        }
    }
}
