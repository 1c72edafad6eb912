//! Root configuration type and its builder.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sluice_sse::SseConfig;
use sluice_telemetry::{LogConfig, MetricsConfig};

use crate::{ConfigError, LogFormat, StreamConfig, TelemetryConfigSection};

/// Complete Sluice configuration.
///
/// Load it with [`ConfigLoader`](crate::ConfigLoader), then convert the
/// sections into the runtime types the engine and telemetry crates take.
///
/// # Example
///
/// ```
/// use sluice_config::SluiceConfig;
///
/// let config = SluiceConfig::default();
/// assert_eq!(config.stream.keep_alive_secs, Some(15));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SluiceConfig {
    /// Event stream settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Logging and metrics settings.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl SluiceConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> SluiceConfigBuilder {
        SluiceConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - the keep-alive interval is zero
    /// - the read buffer capacity is zero
    /// - the metrics address is not a socket address
    /// - the log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.keep_alive_secs == Some(0) {
            return Err(ConfigError::invalid(
                "stream.keep_alive_secs",
                "must be greater than zero; omit it to disable keep-alive",
            ));
        }

        if self.stream.read_buffer_capacity == 0 {
            return Err(ConfigError::invalid(
                "stream.read_buffer_capacity",
                "must be greater than zero",
            ));
        }

        if let Some(addr) = &self.telemetry.metrics.addr {
            if addr.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::invalid(
                    "telemetry.metrics.addr",
                    format!("invalid socket address: {addr}"),
                ));
            }
        }

        if let Err(e) = sluice_telemetry::logging::create_env_filter(&self.telemetry.logging.level)
        {
            return Err(ConfigError::invalid(
                "telemetry.logging.level",
                e.to_string(),
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, no metrics.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs and a Prometheus scrape endpoint.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config.telemetry.metrics.addr = Some("0.0.0.0:9090".to_string());
        config
    }

    /// Stream settings as an engine [`SseConfig`].
    pub fn to_sse_config(&self) -> SseConfig {
        let mut builder = SseConfig::builder().read_buffer_capacity(self.stream.read_buffer_capacity);
        builder = match self.stream.keep_alive_secs {
            Some(secs) => builder.keep_alive_interval(Duration::from_secs(secs)),
            None => builder.no_keep_alive(),
        };
        if let Some(ms) = self.stream.default_retry_ms {
            builder = builder.default_retry(Duration::from_millis(ms));
        }
        builder.build()
    }

    /// Logging settings as a telemetry [`LogConfig`].
    pub fn to_log_config(&self) -> LogConfig {
        let logging = &self.telemetry.logging;
        LogConfig {
            enabled: logging.enabled,
            level: logging.level.clone(),
            json_format: logging.format == LogFormat::Json,
            span_events: logging.span_events,
            file_line_info: logging.include_location,
            include_target: logging.include_target,
        }
    }

    /// Metrics settings as a telemetry [`MetricsConfig`].
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.telemetry.metrics.enabled,
            addr: self.telemetry.metrics.addr.clone(),
        }
    }
}

/// Builder for [`SluiceConfig`].
#[derive(Debug, Default)]
pub struct SluiceConfigBuilder {
    stream: Option<StreamConfig>,
    telemetry: Option<TelemetryConfigSection>,
}

impl SluiceConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stream section.
    #[must_use]
    pub fn stream(mut self, stream: StreamConfig) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration without validation.
    #[must_use]
    pub fn build(self) -> SluiceConfig {
        SluiceConfig {
            stream: self.stream.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build_validated(self) -> Result<SluiceConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
