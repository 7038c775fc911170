//! # Design
//!
//! - Hashing failures stay local to a unit and are reported, never raised.
//! - Enumeration failures belong to a pass, not to any unit.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for hashing.
pub type HashResult<T> = Result<T, HashError>;

/// Result type for pass-level pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors produced while hashing a sample.
#[derive(Debug, Error)]
pub enum HashError {
    /// The sample could not be read.
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
}

/// Errors raised outside any single unit.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Listing the sample directory failed.
    #[error("failed to list samples in {}", path.display())]
    Enumerate {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying walkdir error.
        #[source]
        source: walkdir::Error,
    },
    /// The blocking listing task panicked or was cancelled.
    #[error("sample listing task failed")]
    ListingTask {
        /// Underlying join error.
        #[source]
        source: tokio::task::JoinError,
    },
}
