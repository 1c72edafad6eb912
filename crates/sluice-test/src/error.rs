//! Test error types.

use std::fmt;

/// Errors that can occur while collecting test output.
#[derive(Debug)]
pub enum TestError {
    /// Reading a body frame failed
    BodyRead(String),
    /// Output was not valid UTF-8
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyRead(msg) => write!(f, "Body read error: {msg}"),
            Self::Utf8(e) => write!(f, "UTF-8 error: {e}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(e) => Some(e),
            Self::BodyRead(_) => None,
        }
    }
}

impl From<std::string::FromUtf8Error> for TestError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}
