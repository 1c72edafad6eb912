//! Stream configuration.

use std::time::Duration;

/// Default interval between keep-alive comments.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Default initial capacity of a parser's read buffer.
pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Configuration for event streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseConfig {
    /// Interval between keep-alive comments on an idle outgoing stream.
    pub keep_alive_interval: Option<Duration>,
    /// Retry hint sent as the first frame of an outgoing stream.
    pub default_retry: Option<Duration>,
    /// Initial capacity of a parser's read buffer.
    pub read_buffer_capacity: usize,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            keep_alive_interval: Some(DEFAULT_KEEP_ALIVE),
            default_retry: None,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
        }
    }
}

impl SseConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for configuration.
    pub fn builder() -> SseConfigBuilder {
        SseConfigBuilder::default()
    }

    /// Set the keep-alive interval.
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = Some(interval);
        self
    }

    /// Disable keep-alive.
    pub fn without_keep_alive(mut self) -> Self {
        self.keep_alive_interval = None;
        self
    }

    /// Set the initial retry hint.
    pub fn with_default_retry(mut self, retry: Duration) -> Self {
        self.default_retry = Some(retry);
        self
    }

    /// Set the read buffer capacity.
    pub fn with_read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity;
        self
    }
}

/// Builder for [`SseConfig`].
#[derive(Debug, Default)]
pub struct SseConfigBuilder {
    keep_alive_interval: Option<Option<Duration>>,
    default_retry: Option<Option<Duration>>,
    read_buffer_capacity: Option<usize>,
}

impl SseConfigBuilder {
    /// Set the keep-alive interval.
    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = Some(Some(interval));
        self
    }

    /// Disable keep-alive.
    pub fn no_keep_alive(mut self) -> Self {
        self.keep_alive_interval = Some(None);
        self
    }

    /// Set the initial retry hint.
    pub fn default_retry(mut self, retry: Duration) -> Self {
        self.default_retry = Some(Some(retry));
        self
    }

    /// Do not send an initial retry hint.
    pub fn no_default_retry(mut self) -> Self {
        self.default_retry = Some(None);
        self
    }

    /// Set the read buffer capacity.
    pub fn read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = Some(capacity);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SseConfig {
        let mut config = SseConfig::default();

        if let Some(interval) = self.keep_alive_interval {
            config.keep_alive_interval = interval;
        }
        if let Some(retry) = self.default_retry {
            config.default_retry = retry;
        }
        if let Some(capacity) = self.read_buffer_capacity {
            config.read_buffer_capacity = capacity;
        }

        config
    }
}
