//! Observability for Sluice.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: Prometheus-format counters via the `metrics` crate
//!
//! The SSE core records through the helpers in [`metrics`]; applications
//! decide whether anything is exported by calling [`init_telemetry`] (or the
//! individual `init_*` functions) at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use sluice_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::production(), &MetricsConfig {
//!     enabled: true,
//!     addr: Some("0.0.0.0:9090".to_string()),
//! })?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and metrics together.
///
/// # Errors
///
/// Returns the first initialization failure.
pub fn init_telemetry(log: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(log)?;
    init_metrics(metrics)?;
    Ok(())
}
