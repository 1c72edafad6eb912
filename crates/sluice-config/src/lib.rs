//! # Sluice Config
//!
//! Typed, layered configuration for Sluice.
//!
//! Sources are applied in order: defaults (or a preset), a TOML/JSON file,
//! then `PREFIX__SECTION__KEY` environment variables. Unknown fields in
//! files are rejected.
//!
//! ## Example
//!
//! ```no_run
//! use sluice_config::ConfigLoader;
//!
//! # fn main() -> Result<(), sluice_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("sluice.toml")?
//!     .with_env_prefix("SLUICE")
//!     .load()?;
//!
//! let sse = config.to_sse_config();
//! # let _ = sse;
//! # Ok(())
//! # }
//! ```
//!
//! ## Example file
//!
//! ```toml
//! [stream]
//! keep_alive_secs = 15
//! default_retry_ms = 3000
//! read_buffer_capacity = 8192
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{SluiceConfig, SluiceConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, MetricsSection, StreamConfig, TelemetryConfigSection};
