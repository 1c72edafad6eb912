//! Errors raised while loading or validating configuration.

use std::path::PathBuf;
use thiserror::Error;

/// A configuration source could not be turned into a valid [`SluiceConfig`].
///
/// [`SluiceConfig`]: crate::SluiceConfig
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No file exists at the given path.
    #[error("no configuration file at {}", .path.display())]
    MissingFile {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but reading it failed.
    #[error("cannot read {}", .path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file or string is neither TOML nor JSON.
    #[error("unsupported configuration format `{0}` (expected toml or json)")]
    UnsupportedFormat(String),

    /// TOML content did not match the schema.
    #[error("bad TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON content did not match the schema.
    #[error("bad JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file could not be applied.
    #[error("bad environment file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// An environment override has an unusable value.
    #[error("environment override {var}: {reason}")]
    EnvOverride {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A loaded value breaks a constraint.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted path of the field, e.g. `stream.keep_alive_secs`.
        field: &'static str,
        /// Which constraint failed.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing_file(path: &std::path::Path) -> Self {
        Self::MissingFile {
            path: path.to_path_buf(),
        }
    }

    pub(crate) fn env_override(var: &str, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Dotted field path for [`ConfigError::Invalid`], `None` otherwise.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}
