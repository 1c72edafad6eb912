//! Prometheus metrics for the SSE engine.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `sluice_events_dispatched_total` | Counter | - | Events delivered by the assembler |
//! | `sluice_events_sent_total` | Counter | - | Event frames written by writers |
//! | `sluice_frame_errors_total` | Counter | `kind` | Fatal framing errors on the read path |
//! | `sluice_connections_closed_total` | Counter | `result` | Read-path terminations |
//! | `sluice_writers_open` | Gauge | - | Writers not yet closed |
//!
//! The recording helpers are cheap no-ops until [`init_metrics`] installs a
//! recorder.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names.
pub mod names {
    /// Events delivered to a handler.
    pub const EVENTS_DISPATCHED: &str = "sluice_events_dispatched_total";
    /// Event frames written to an output stream.
    pub const EVENTS_SENT: &str = "sluice_events_sent_total";
    /// Fatal framing errors.
    pub const FRAME_ERRORS: &str = "sluice_frame_errors_total";
    /// Read-path terminations.
    pub const CONNECTIONS_CLOSED: &str = "sluice_connections_closed_total";
    /// Open writers.
    pub const WRITERS_OPEN: &str = "sluice_writers_open";
}

/// Metrics configuration. Disabled by default.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to expose the scrape endpoint on (requires a tokio runtime).
    /// `None` installs the recorder without a listener; use
    /// [`render_metrics`] instead.
    pub addr: Option<String>,
}

/// Initializes the metrics subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable listener
/// address and `TelemetryError::MetricsInit` if a recorder is already
/// installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    match &config.addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            // Spawns the scrape listener on the ambient tokio runtime.
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }
        None => {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized or are served by the
/// HTTP listener.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        names::EVENTS_DISPATCHED,
        "Total number of SSE events delivered to a consumer"
    );
    describe_counter!(
        names::EVENTS_SENT,
        "Total number of SSE event frames written to an output stream"
    );
    describe_counter!(
        names::FRAME_ERRORS,
        "Total number of fatal HTTP framing errors by kind"
    );
    describe_counter!(
        names::CONNECTIONS_CLOSED,
        "Total number of event-stream connections closed by result"
    );
    describe_gauge!(names::WRITERS_OPEN, "Number of SSE writers currently open");
}

/// Records an event delivered to a consumer.
pub fn record_event_dispatched() {
    counter!(names::EVENTS_DISPATCHED).increment(1);
}

/// Records an event frame written by a writer.
pub fn record_event_sent() {
    counter!(names::EVENTS_SENT).increment(1);
}

/// Records a fatal framing error.
pub fn record_frame_error(kind: &'static str) {
    counter!(names::FRAME_ERRORS, "kind" => kind).increment(1);
}

/// Records the termination of a read-path connection.
pub fn record_connection_closed(result: &'static str) {
    counter!(names::CONNECTIONS_CLOSED, "result" => result).increment(1);
}

/// Records a writer being opened.
pub fn record_writer_opened() {
    gauge!(names::WRITERS_OPEN).increment(1.0);
}

/// Records a writer being closed.
pub fn record_writer_closed() {
    gauge!(names::WRITERS_OPEN).decrement(1.0);
}
