//! In-memory output stream.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use sluice_sse::ResponseStream;

use crate::error::TestError;

#[derive(Debug, Default)]
struct Inner {
    writes: Mutex<Vec<Bytes>>,
    closes: AtomicUsize,
    failing: AtomicBool,
    disconnected: AtomicBool,
}

/// [`ResponseStream`] that keeps every write in memory.
///
/// Clones share state, so one clone can be handed to a writer and another
/// kept for assertions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    inner: Arc<Inner>,
}

impl MemoryStream {
    /// Create an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream that rejects every write.
    #[must_use]
    pub fn failing() -> Self {
        let stream = Self::new();
        stream.set_failing(true);
        stream
    }

    /// Make writes fail or succeed.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Simulate the peer going away.
    pub fn disconnect(&self) {
        self.inner.disconnected.store(true, Ordering::SeqCst);
    }

    /// Every accepted write, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<Bytes> {
        self.inner.writes.lock().clone()
    }

    /// All accepted bytes concatenated.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.writes.lock().concat()
    }

    /// All accepted bytes as text.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.bytes())?)
    }

    /// Number of times the stream was closed.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }
}

impl ResponseStream for MemoryStream {
    fn send(&self, bytes: Bytes) -> bool {
        if self.inner.failing.load(Ordering::SeqCst) || self.is_closed() {
            return false;
        }
        self.inner.writes.lock().push(bytes);
        true
    }

    fn close(&self) {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.inner.disconnected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_writes() {
        let stream = MemoryStream::new();
        let handle = stream.clone();
        assert!(stream.send(Bytes::from_static(b"a")));
        assert!(stream.send(Bytes::from_static(b"b")));
        assert_eq!(handle.writes().len(), 2);
        assert_eq!(handle.text().unwrap(), "ab");
    }

    #[test]
    fn test_failing_and_disconnected() {
        let stream = MemoryStream::failing();
        assert!(!stream.send(Bytes::from_static(b"x")));
        stream.set_failing(false);
        stream.disconnect();
        assert!(stream.is_closed());
        assert!(!stream.send(Bytes::from_static(b"x")));
        assert!(stream.bytes().is_empty());
    }

    #[test]
    fn test_close_count() {
        let stream = MemoryStream::new();
        stream.close();
        assert_eq!(stream.close_count(), 1);
    }
}
