//! Default values applied when neither the config file nor the CLI sets a field.
//!
//! # Design
//! - Keep the defaults in one place so the template file and validation agree.

use std::time::Duration;

/// Directory scanned for samples in a freshly generated template.
pub const MALWARE_DIRECTORY: &str = "malware_files";
/// Number of passes written to a freshly generated template.
pub const NUMBER_OF_PASSES: u32 = 1;
/// Worker slots written to a freshly generated template.
pub const NUMBER_OF_THREADS: usize = 5;
/// Worker slots used when running from flags alone, without `--conf`.
pub const FLAG_NUMBER_OF_THREADS: usize = 1;
/// Largest accepted worker slot count.
pub const MAX_NUMBER_OF_THREADS: usize = 1024;
/// Per-request timeout applied to Capture API calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Capture appliances commonly present self-signed certificates.
pub const ACCEPT_INVALID_CERTS: bool = true;
/// File name used when no explicit config path is supplied.
pub const CONFIG_FILE_NAME: &str = "cannon.toml";
