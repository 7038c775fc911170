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

//! Concurrent hash → lookup → decide → upload pipeline.
//!
//! Layout:
//! - `hasher.rs`: SHA-256 digests and `FileUnit` construction
//! - `policy.rs`: verdict-to-action decision
//! - `worker.rs`: one file end-to-end, failures folded into its outcome
//! - `scheduler.rs`: bounded fan-out and repeated passes
//! - `reporter.rs`: outcome sinks (tracing, in-memory)
//! - `source.rs`: per-pass file enumeration

pub mod error;
pub mod hasher;
pub mod policy;
pub mod reporter;
pub mod scheduler;
pub mod source;
pub mod worker;

pub use error::{HashError, HashResult, PipelineError, PipelineResult};
pub use hasher::{FileUnit, digest, hash_file};
pub use policy::{Action, SkipReason, decide};
pub use reporter::{CollectingReporter, Reporter, TracingReporter};
pub use scheduler::{PassSummary, Scheduler};
pub use source::{DirectorySource, FileSource, StaticSource};
pub use worker::{Outcome, Stage, UnitReport, UnitWorker};
