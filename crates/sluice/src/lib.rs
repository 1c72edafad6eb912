//! # Sluice
//!
//! **Incremental Server-Sent Events engine**
//!
//! - **Read side**: [`ResponseFrameParser`](sse::ResponseFrameParser) turns an
//!   HTTP/1.x response delivered in arbitrary fragments into events
//! - **Write side**: [`SseWriter`](sse::SseWriter) formats events for a
//!   long-lived response and closes exactly once under concurrency
//! - **Ambient**: layered configuration and `tracing`/Prometheus telemetry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sluice::prelude::*;
//!
//! # fn main() -> Result<(), sluice::Error> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("sluice.toml")?
//!     .with_env_prefix("SLUICE")
//!     .load()?;
//! let sse_config = sluice::init(&config)?;
//!
//! let (headers, writer, body) = sse_response(sse_config);
//! writer.send(&SseEvent::typed("ready", "ok"));
//! # let _ = (headers, body);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/sluice/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error;

// Re-export the event engine
pub use sluice_sse as sse;

// Re-export configuration
pub use sluice_config as config;

// Re-export telemetry
pub use sluice_telemetry as telemetry;

/// Startup errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] sluice_config::ConfigError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] sluice_telemetry::TelemetryError),
}

/// Validates `config`, installs logging and metrics as it describes, and
/// returns the stream settings for new writers and parsers.
///
/// # Errors
///
/// Returns an error if validation fails or a global subscriber or recorder
/// is already installed.
pub fn init(config: &sluice_config::SluiceConfig) -> Result<sluice_sse::SseConfig, Error> {
    config.validate()?;
    sluice_telemetry::init_telemetry(&config.to_log_config(), &config.to_metrics_config())?;
    Ok(config.to_sse_config())
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use sluice::prelude::*;
///
/// let event = SseEvent::typed("update", "42");
/// assert_eq!(event.to_sse_string(), "event:update\ndata:42\n\n");
/// ```
pub mod prelude {
    pub use sluice_sse::{
        sse_response, ChannelHandler, ClientMessage, EventAssembler, ResponseFrameParser,
        ResponseHead, ResponseStream, SharedWriter, SseBody, SseConfig, SseError, SseEvent,
        SseHandler, SseItem, SseResult, SseWriter, Termination,
    };

    pub use sluice_config::{ConfigError, ConfigLoader, SluiceConfig};

    pub use sluice_telemetry::{init_telemetry, LogConfig, MetricsConfig};
}
