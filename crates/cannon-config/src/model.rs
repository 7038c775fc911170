//! Typed configuration models.
//!
//! # Design
//! - `ConfigDocument` is the loosely typed layer shared by the TOML file and
//!   the command line; every field is optional so layers can be merged.
//! - `BatchConfig` is the validated, immutable value handed to the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults;

/// Validated run configuration, immutable for the lifetime of the process.
///
/// Production code obtains it from [`crate::validate`]; the fields stay public
/// so tests can describe a run directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Directory whose regular files are submitted every pass.
    pub directory: PathBuf,
    /// Base URL of the Capture API server.
    pub server_url: Url,
    /// Appliance serial used as the API user.
    pub serial: String,
    /// API key paired with the serial.
    pub api_key: String,
    /// Upload every sample regardless of its verdict.
    pub ignore_verdict: bool,
    /// Number of sequential passes over the directory (at least one).
    pub pass_count: u32,
    /// Maximum number of files processed simultaneously (at least one).
    pub concurrency: usize,
    /// Transport timeout applied to each Capture API request.
    pub request_timeout: Duration,
    /// Skip TLS certificate verification for the Capture API server.
    pub accept_invalid_certs: bool,
}

impl BatchConfig {
    /// API key with everything but the last four characters masked, for logs.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let visible: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let hidden = self.api_key.chars().count().saturating_sub(4);
        format!("{}{visible}", "*".repeat(hidden))
    }
}

/// One layer of settings, read from `cannon.toml` or assembled from CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    /// Directory holding the samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub malware_directory: Option<PathBuf>,
    /// Full URL of the Capture API server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_api_server: Option<String>,
    /// Capture API serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_api_serial: Option<String>,
    /// Capture API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_api_key: Option<String>,
    /// Upload files regardless of verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_verdict: Option<bool>,
    /// Number of times to repeat the routine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_passes: Option<u32>,
    /// Number of concurrent workers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_threads: Option<usize>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Skip TLS certificate verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_invalid_certs: Option<bool>,
}

impl ConfigDocument {
    /// Document written by `--init-config`.
    #[must_use]
    pub fn template() -> Self {
        Self {
            malware_directory: Some(PathBuf::from(defaults::MALWARE_DIRECTORY)),
            capture_api_server: Some(String::new()),
            capture_api_serial: Some(String::new()),
            capture_api_key: Some(String::new()),
            ignore_verdict: Some(false),
            number_of_passes: Some(defaults::NUMBER_OF_PASSES),
            number_of_threads: Some(defaults::NUMBER_OF_THREADS),
            request_timeout_secs: Some(defaults::REQUEST_TIMEOUT.as_secs()),
            accept_invalid_certs: Some(defaults::ACCEPT_INVALID_CERTS),
        }
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    #[must_use]
    pub fn layer(self, other: Self) -> Self {
        Self {
            malware_directory: other.malware_directory.or(self.malware_directory),
            capture_api_server: other.capture_api_server.or(self.capture_api_server),
            capture_api_serial: other.capture_api_serial.or(self.capture_api_serial),
            capture_api_key: other.capture_api_key.or(self.capture_api_key),
            ignore_verdict: other.ignore_verdict.or(self.ignore_verdict),
            number_of_passes: other.number_of_passes.or(self.number_of_passes),
            number_of_threads: other.number_of_threads.or(self.number_of_threads),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            accept_invalid_certs: other.accept_invalid_certs.or(self.accept_invalid_certs),
        }
    }
}
