//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was absent from both the file and the command line.
    #[error("{field} was not provided")]
    MissingField {
        /// Name of the missing setting.
        field: &'static str,
    },
    /// A setting contained an invalid value.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// Setting that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file {}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// Rendering the template document failed.
    #[error("failed to render configuration template")]
    Render {
        /// Underlying TOML error.
        #[source]
        source: toml::ser::Error,
    },
    /// Refused to overwrite an existing configuration file.
    #[error("configuration file {} already exists", path.display())]
    AlreadyExists {
        /// File that already exists.
        path: PathBuf,
    },
    /// File system operation failed.
    #[error("configuration {operation} failed for {}", path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        #[source]
        source: io::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
