//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults.

use serde::{Deserialize, Serialize};

/// Event stream section.
///
/// # Example
///
/// ```
/// use sluice_config::StreamConfig;
///
/// let config = StreamConfig {
///     keep_alive_secs: Some(30),
///     default_retry_ms: Some(3000),
///     read_buffer_capacity: 16 * 1024,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Seconds between keep-alive comments. None disables keep-alive.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: Option<u64>,

    /// Retry hint in milliseconds sent when a stream opens.
    #[serde(default)]
    pub default_retry_ms: Option<u64>,

    /// Initial capacity of a parser's read buffer in bytes.
    #[serde(default = "default_read_buffer_capacity")]
    pub read_buffer_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keep_alive_secs: default_keep_alive(),
            default_retry_ms: None,
            read_buffer_capacity: default_read_buffer_capacity(),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_keep_alive() -> Option<u64> {
    Some(sluice_sse::DEFAULT_KEEP_ALIVE.as_secs())
}

fn default_read_buffer_capacity() -> usize {
    sluice_sse::DEFAULT_READ_BUFFER_CAPACITY
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Address for a Prometheus scrape endpoint. Without one, metrics are
    /// only available through rendering.
    #[serde(default)]
    pub addr: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `sluice_sse=trace`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in log records.
    #[serde(default)]
    pub include_location: bool,

    /// Log span open and close.
    #[serde(default)]
    pub span_events: bool,

    /// Include the event target in log records.
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
            span_events: false,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_default() {
        let config = StreamConfig::default();
        assert_eq!(config.keep_alive_secs, Some(15));
        assert_eq!(config.default_retry_ms, None);
        assert_eq!(config.read_buffer_capacity, 8192);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: StreamConfig = toml::from_str("default_retry_ms = 2500").unwrap();
        assert_eq!(config.keep_alive_secs, Some(15));
        assert_eq!(config.default_retry_ms, Some(2500));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<StreamConfig, _> = toml::from_str("buffer_size = 4");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_lowercase() {
        let section: LoggingSection = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(section.format, LogFormat::Pretty);
        assert!(section.include_target);
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        let metrics = MetricsSection::default();
        assert!(!metrics.enabled);
        assert!(metrics.addr.is_none());
    }
}
