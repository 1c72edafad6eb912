//! # Sluice SSE
//!
//! Incremental Server-Sent Events engine.
//!
//! The read side turns an HTTP/1.x response, delivered in arbitrary
//! fragments, into discrete events. The write side formats events into
//! wire-exact bytes for a long-lived response.
//!
//! ## Features
//!
//! - **Fragmentation invariant parsing**: the same events are dispatched
//!   however the input bytes are split
//! - **HTTP framing**: status line, headers, chunked, `Content-Length` and
//!   close-delimited bodies
//! - **Exactly-once termination**: the closed notification fires once per
//!   connection on every path
//! - **Concurrent writer**: one-shot atomic close that composes with
//!   in-flight sends
//! - **Hyper body**: channel-backed body with retry hint and keep-alive
//!
//! ## Reading
//!
//! ```rust
//! use bytes::BytesMut;
//! use sluice_sse::{ResponseFrameParser, SseEvent, Termination};
//!
//! let mut events = Vec::new();
//! let mut parser = ResponseFrameParser::new(|event: SseEvent| events.push(event));
//!
//! let mut buf = BytesMut::new();
//! for fragment in [&b"HTTP/1.1 200 OK\r\n\r\nevent: gr"[..], b"eet\nid: 1\ndata: hi\n\n"] {
//!     buf.extend_from_slice(fragment);
//!     parser.feed(&mut buf).unwrap();
//! }
//! parser.on_close(Termination::Completed);
//! assert_eq!(parser.last_event_id(), "1");
//! drop(parser);
//!
//! assert_eq!(events[0], SseEvent::typed("greet", "hi").id("1"));
//! ```
//!
//! ## Writing
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sluice_sse::{sse_response, SseConfig, SseEvent};
//!
//! async fn events_handler() {
//!     let (headers, writer, body) = sse_response(
//!         SseConfig::new().with_default_retry(Duration::from_secs(3)),
//!     );
//!     let writer = Arc::new(writer);
//!
//!     let producer = Arc::clone(&writer);
//!     tokio::spawn(async move {
//!         let mut counter = 0u64;
//!         while producer.send(&SseEvent::typed("tick", counter.to_string())) {
//!             counter += 1;
//!             tokio::time::sleep(Duration::from_secs(1)).await;
//!         }
//!     });
//!
//!     let _response = (headers, body.into_http_body());
//! }
//! ```
//!
//! ## Wire format
//!
//! ```text
//! event:update
//! id:1
//! retry:3000
//! data:Hello, World!
//!
//! ```
//!
//! Comments start with `:` and are used for keep-alive.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod assembler;
mod chunked;
mod config;
mod error;
mod event;
mod line;
mod response;
mod stream;
mod writer;

pub use assembler::EventAssembler;
pub use chunked::{ChunkDecoder, ChunkProgress, ChunkState};
pub use config::{SseConfig, SseConfigBuilder, DEFAULT_KEEP_ALIVE, DEFAULT_READ_BUFFER_CAPACITY};
pub use error::{SseError, SseResult};
pub use event::{SseEvent, SseItem, DEFAULT_EVENT_TYPE};
pub use response::{
    BodyFraming, ChannelHandler, ClientMessage, ParseStatus, ResponseFrameParser, ResponseHead,
    SseHandler, Termination,
};
pub use stream::{sse_headers, sse_response, ChannelStream, SseBody, EVENT_STREAM_CONTENT_TYPE};
pub use writer::{ResponseStream, SharedWriter, SseWriter};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::assembler::EventAssembler;
    pub use crate::config::SseConfig;
    pub use crate::error::{SseError, SseResult};
    pub use crate::event::{SseEvent, SseItem};
    pub use crate::response::{ResponseFrameParser, ResponseHead, SseHandler, Termination};
    pub use crate::stream::{sse_response, SseBody};
    pub use crate::writer::{ResponseStream, SharedWriter, SseWriter};
}
