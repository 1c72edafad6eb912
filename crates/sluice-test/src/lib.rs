//! # Sluice Test
//!
//! Test utilities for Sluice event streams. Nothing here touches the
//! network.
//!
//! ## Key Features
//!
//! - **Recording handler**: captures heads, events and closed notifications,
//!   readable after the handler is moved into a parser
//! - **Memory stream**: an output stream that records writes and can be made
//!   to fail
//! - **Fragmentation helpers**: split, chunk-encode and feed wire input
//!
//! ## Example
//!
//! ```
//! use sluice_sse::ResponseFrameParser;
//! use sluice_test::{byte_by_byte, chunked_encode, feed_fragments, http_response, RecordingHandler};
//!
//! let body = chunked_encode(b"data:Hello\n\n", 4);
//! let raw = http_response(200, &[("Transfer-Encoding", "chunked")], &body);
//!
//! let handler = RecordingHandler::new();
//! let recorded = handler.recorded();
//! let mut parser = ResponseFrameParser::new(handler);
//! feed_fragments(&mut parser, byte_by_byte(&raw)).unwrap();
//!
//! assert_eq!(recorded.event_data(), ["Hello"]);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod error;
mod fragment;
mod handler;
mod stream;

pub use body::{collect_body, collect_text};
pub use error::TestError;
pub use fragment::{byte_by_byte, chunked_encode, feed_fragments, http_response, split_at_points};
pub use handler::{Recorded, Recording, RecordingHandler};
pub use stream::MemoryStream;
