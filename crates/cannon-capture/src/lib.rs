#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Client for the Capture API reputation and scan routes.
//!
//! Layout: `model.rs` (verdicts and response DTOs), `error.rs` (the error-kind
//! taxonomy shared with the pipeline), `client.rs` (`VerdictService` trait and
//! the reqwest-backed `CaptureClient`).

pub mod client;
pub mod error;
pub mod model;

pub use client::{CaptureClient, REPORT_PATH, SCAN_PATH, VerdictService};
pub use error::{CaptureError, CaptureResult, ErrorKind};
pub use model::{UploadResult, Verdict, VerdictResponse};
