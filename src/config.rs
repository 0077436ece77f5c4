//! Configuration for deferred handles.
//!
//! ```
//! use defcon::HandleConfig;
//!
//! let config = HandleConfig::new()
//!     .label("user-repository")
//!     .warn_on_blocking_wait(false);
//! assert_eq!(config.label, "user-repository");
//! ```
//!
//! With the `config-file` feature the same settings can be read from TOML:
//!
//! ```toml
//! label = "user-repository"
//! warn_on_blocking_wait = false
//! ```

use serde::Deserialize;

/// Default label attached to log events.
pub const DEFAULT_LABEL: &str = "deferred";

/// Settings for one deferred handle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandleConfig {
    /// Name carried by every log event of this handle.
    pub label: String,
    /// Log a warning when a synchronous call has to block on construction.
    pub warn_on_blocking_wait: bool,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            warn_on_blocking_wait: true,
        }
    }
}

impl HandleConfig {
    /// Create a new handle config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set whether blocking synchronous calls are logged.
    #[must_use]
    pub fn warn_on_blocking_wait(mut self, warn: bool) -> Self {
        self.warn_on_blocking_wait = warn;
        self
    }

    /// Parse a config from a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        toml::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Read and parse a config from a TOML file.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&document)
    }
}

/// Errors raised while loading a [`HandleConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// Path that was read.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The document is not a valid handle config.
    #[error("invalid handle config: {0}")]
    Parse(String),
}
