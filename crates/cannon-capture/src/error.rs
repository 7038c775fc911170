//! # Design
//!
//! - One error type for both Capture API routes, classified into a small set
//!   of kinds the pipeline can tag outcomes with.
//! - Keep the operation that failed as a context field.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result alias for Capture API operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Coarse classification of a failure, used to tag failed outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Local file unreadable or missing.
    Io,
    /// Credentials rejected by the service.
    Auth,
    /// A network call exceeded its deadline.
    Timeout,
    /// Malformed or unexpected response.
    Protocol,
    /// Any other connectivity failure.
    Network,
}

impl ErrorKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Auth => "auth",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
            Self::Network => "network",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors produced by the Capture API client.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The sample could not be read for upload.
    #[error("failed to {operation} {}", path.display())]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path of the sample.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The service rejected the serial/key pair.
    #[error("{operation} rejected credentials (HTTP {status}); check the Capture API serial and key")]
    Auth {
        /// Operation that was rejected.
        operation: &'static str,
        /// HTTP status returned.
        status: u16,
    },
    /// The request did not complete within the configured timeout.
    #[error("{operation} timed out")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The response did not have the expected shape.
    #[error("{operation} returned an unexpected response: {detail}")]
    Protocol {
        /// Operation whose response was malformed.
        operation: &'static str,
        /// Description of the mismatch.
        detail: String,
    },
    /// Connectivity failure other than a timeout.
    #[error("{operation} failed to reach the Capture API")]
    Network {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The configured server URL could not be extended with a route.
    #[error("invalid Capture API route {route}")]
    InvalidRoute {
        /// Route that could not be joined.
        route: &'static str,
        /// Underlying URL error.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
}

impl CaptureError {
    /// Classify the error for outcome reporting.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Protocol { .. } | Self::InvalidRoute { .. } => ErrorKind::Protocol,
            Self::Network { .. } | Self::ClientBuild { .. } => ErrorKind::Network,
        }
    }

    pub(crate) fn transport(operation: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { operation, source }
        } else {
            Self::Network { operation, source }
        }
    }

    pub(crate) fn protocol(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            detail: detail.into(),
        }
    }
}
