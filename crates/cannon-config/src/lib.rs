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

//! Run configuration for the capture cannon.
//!
//! Layout: `model.rs` (typed `BatchConfig` and the layered `ConfigDocument`),
//! `loader.rs` (TOML file loading and template generation), `validate.rs`
//! (merging into a validated `BatchConfig`), `defaults.rs` (fallback values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_document, write_template};
pub use model::{BatchConfig, ConfigDocument};
pub use validate::{parse_yes_no, validate};
