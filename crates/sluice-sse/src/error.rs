//! Error types for Server-Sent Events operations.

use thiserror::Error;

/// Result type for SSE operations.
pub type SseResult<T> = Result<T, SseError>;

/// Errors that can occur while framing, parsing, or writing an event stream.
#[derive(Debug, Error)]
pub enum SseError {
    /// The HTTP status line could not be parsed.
    #[error("malformed status line: {0}")]
    MalformedStatusLine(String),

    /// The status line names an HTTP version other than 1.0 or 1.1.
    #[error("unsupported HTTP version: {0}")]
    UnsupportedVersion(String),

    /// A chunk-size line is not a hexadecimal integer.
    #[error("invalid chunk size: {0:?}")]
    InvalidChunkSize(String),

    /// Chunk data was not followed by a line terminator.
    #[error("chunk data not followed by CRLF")]
    InvalidChunkTerminator,

    /// The response head holds more headers than a header map can store.
    #[error("too many response headers")]
    TooManyHeaders,

    /// The `Content-Length` header is not a decimal integer.
    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    /// Failed to serialize event data.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}

impl SseError {
    /// Create a malformed status line error.
    pub fn malformed_status_line(line: impl Into<String>) -> Self {
        Self::MalformedStatusLine(line.into())
    }

    /// Create an invalid chunk size error.
    pub fn invalid_chunk_size(token: impl Into<String>) -> Self {
        Self::InvalidChunkSize(token.into())
    }

    /// Create an invalid content length error.
    pub fn invalid_content_length(value: impl Into<String>) -> Self {
        Self::InvalidContentLength(value.into())
    }

    /// Create a serialization failed error.
    pub fn serialization_failed(reason: impl Into<String>) -> Self {
        Self::SerializationFailed(reason.into())
    }

    /// Check if this error terminates the read path of a connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedStatusLine(_)
                | Self::UnsupportedVersion(_)
                | Self::InvalidChunkSize(_)
                | Self::InvalidChunkTerminator
                | Self::TooManyHeaders
                | Self::InvalidContentLength(_)
        )
    }

    /// Short label used for metrics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::MalformedStatusLine(_) => "status_line",
            Self::UnsupportedVersion(_) => "version",
            Self::InvalidChunkSize(_) => "chunk_size",
            Self::InvalidChunkTerminator => "chunk_terminator",
            Self::TooManyHeaders => "too_many_headers",
            Self::InvalidContentLength(_) => "content_length",
            Self::SerializationFailed(_) => "serialization",
        }
    }
}
