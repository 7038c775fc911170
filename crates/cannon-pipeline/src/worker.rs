//! Process one sample: hash, look up, decide, and conditionally upload.
//!
//! # Design
//!
//! - Every failure is folded into the unit's [`Outcome`]; `process` never
//!   returns an error and never affects other units.
//! - Stages run strictly in order and a failed stage ends the unit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cannon_capture::{CaptureError, ErrorKind, Verdict, VerdictService};
use cannon_config::BatchConfig;
use cannon_telemetry::Metrics;
use serde::Serialize;
use tracing::{Instrument, debug, info_span};

use crate::hasher::{FileUnit, hash_file_blocking};
use crate::policy::{SkipReason, decide};

/// Stage a unit was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Computing the digest.
    Hashing,
    /// Querying the verdict.
    LookingUp,
    /// Submitting the sample.
    Uploading,
}

impl Stage {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hashing => "hashing",
            Self::LookingUp => "looking_up",
            Self::Uploading => "uploading",
        }
    }
}

/// Terminal result of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The sample was submitted and the service answered.
    Uploaded {
        /// Scan identifier when the service accepted the sample.
        scan_id: Option<String>,
        /// HTTP status of the scan request.
        http_status: u16,
        /// Message returned by the service.
        message: String,
    },
    /// The verdict meant the sample was not submitted.
    Skipped {
        /// Verdict class that caused the skip.
        reason: SkipReason,
    },
    /// A stage failed.
    Failed {
        /// Stage that failed.
        stage: Stage,
        /// Classification of the failure.
        kind: ErrorKind,
        /// Human-readable failure description.
        message: String,
    },
    /// The unit task ended without producing a result.
    Aborted {
        /// Description of the abort.
        message: String,
    },
}

impl Outcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Uploaded { .. } => "uploaded",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } | Self::Aborted { .. } => "failed",
        }
    }
}

/// Everything known about a unit once it finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    /// Sample location.
    pub path: PathBuf,
    /// Digest, absent if hashing failed.
    pub digest: Option<String>,
    /// Size in bytes, absent if hashing failed.
    pub size_bytes: Option<u64>,
    /// Verdict, absent if the lookup did not complete.
    pub verdict: Option<Verdict>,
    /// Terminal outcome.
    pub outcome: Outcome,
}

impl UnitReport {
    pub(crate) fn aborted(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            digest: None,
            size_bytes: None,
            verdict: None,
            outcome: Outcome::Aborted {
                message: message.into(),
            },
        }
    }

    /// File name of the sample, falling back to the full path.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// Runs units against a verdict service under one batch configuration.
#[derive(Clone)]
pub struct UnitWorker {
    service: Arc<dyn VerdictService>,
    config: Arc<BatchConfig>,
    metrics: Option<Metrics>,
}

impl UnitWorker {
    /// Construct a worker.
    #[must_use]
    pub fn new(service: Arc<dyn VerdictService>, config: Arc<BatchConfig>) -> Self {
        Self {
            service,
            config,
            metrics: None,
        }
    }

    /// Record lookup, upload, and in-flight counts on `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Batch configuration this worker runs under.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process one sample to completion.
    pub async fn process(&self, path: PathBuf) -> UnitReport {
        let span = info_span!("unit", file = %path.display());
        if let Some(metrics) = &self.metrics {
            metrics.unit_started();
        }
        let report = self.run_stages(path).instrument(span).await;
        if let Some(metrics) = &self.metrics {
            metrics.unit_finished();
        }
        report
    }

    async fn run_stages(&self, path: PathBuf) -> UnitReport {
        let unit = match hash_file_blocking(path.clone()).await {
            Ok(unit) => unit,
            Err(err) => {
                return UnitReport {
                    path,
                    digest: None,
                    size_bytes: None,
                    verdict: None,
                    outcome: Outcome::Failed {
                        stage: Stage::Hashing,
                        kind: ErrorKind::Io,
                        message: err.to_string(),
                    },
                };
            }
        };
        debug!(sha256 = %unit.digest, size_bytes = unit.size_bytes, "hashed");

        let (verdict, outcome) = self.resolve(&unit).await;
        let FileUnit {
            path,
            digest,
            size_bytes,
        } = unit;
        UnitReport {
            path,
            digest: Some(digest),
            size_bytes: Some(size_bytes),
            verdict,
            outcome,
        }
    }

    async fn resolve(&self, unit: &FileUnit) -> (Option<Verdict>, Outcome) {
        let verdict = match self.service.lookup_verdict(&unit.digest).await {
            Ok(response) => {
                self.record_lookup(&response.http_status.to_string());
                response.verdict
            }
            Err(err) => {
                self.record_lookup(err.kind().as_str());
                return (None, failed(Stage::LookingUp, &err));
            }
        };

        let action = decide(&verdict, self.config.ignore_verdict);
        if let Some(reason) = action.skip_reason() {
            return (Some(verdict), Outcome::Skipped { reason });
        }

        debug!(stage = Stage::Uploading.as_str(), "submitting");
        let outcome = self.upload(&unit.path).await;
        (Some(verdict), outcome)
    }

    async fn upload(&self, path: &Path) -> Outcome {
        match self.service.upload_file(path).await {
            Ok(result) => {
                self.record_upload(&result.http_status.to_string());
                Outcome::Uploaded {
                    scan_id: result.scan_id,
                    http_status: result.http_status,
                    message: result.message,
                }
            }
            Err(err) => {
                self.record_upload(err.kind().as_str());
                failed(Stage::Uploading, &err)
            }
        }
    }

    fn record_lookup(&self, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_lookup(status);
        }
    }

    fn record_upload(&self, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_upload(status);
        }
    }
}

fn failed(stage: Stage, err: &CaptureError) -> Outcome {
    Outcome::Failed {
        stage,
        kind: err.kind(),
        message: err.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use cannon_capture::{
        CaptureError, CaptureResult, UploadResult, Verdict, VerdictResponse,
    };
    use serde_json::json;

    /// Scripted verdict service keyed by digest.
    #[derive(Default)]
    pub(crate) struct FakeService {
        pub(crate) verdicts: HashMap<String, Verdict>,
        pub(crate) failing_digests: Vec<String>,
        pub(crate) failing_uploads: Vec<PathBuf>,
        pub(crate) delay: Option<Duration>,
        pub(crate) lookups: Mutex<Vec<String>>,
        pub(crate) uploads: Mutex<Vec<PathBuf>>,
        pub(crate) in_flight: AtomicUsize,
        pub(crate) max_in_flight: AtomicUsize,
    }

    impl FakeService {
        pub(crate) fn with_verdict(mut self, digest: &str, verdict: Verdict) -> Self {
            self.verdicts.insert(digest.to_string(), verdict);
            self
        }

        pub(crate) fn lookups_for(&self, digest: &str) -> usize {
            self.lookups
                .lock()
                .expect("lookup log poisoned")
                .iter()
                .filter(|seen| seen.as_str() == digest)
                .count()
        }

        pub(crate) fn upload_count(&self) -> usize {
            self.uploads.lock().expect("upload log poisoned").len()
        }

        async fn network_call(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl cannon_capture::VerdictService for FakeService {
        async fn lookup_verdict(&self, digest: &str) -> CaptureResult<VerdictResponse> {
            self.network_call().await;
            self.lookups
                .lock()
                .expect("lookup log poisoned")
                .push(digest.to_string());

            if self.failing_digests.iter().any(|failing| failing == digest) {
                return Err(CaptureError::Auth {
                    operation: "look up verdict",
                    status: 401,
                });
            }
            let verdict = self
                .verdicts
                .get(digest)
                .cloned()
                .unwrap_or(Verdict::Unknown);
            Ok(VerdictResponse {
                raw: json!({ "analysis_result": verdict.as_str() }),
                verdict,
                http_status: 200,
            })
        }

        async fn upload_file(&self, path: &Path) -> CaptureResult<UploadResult> {
            self.network_call().await;
            if self.failing_uploads.iter().any(|failing| failing == path) {
                return Err(CaptureError::Io {
                    operation: "open sample for upload",
                    path: path.to_path_buf(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            }
            self.uploads
                .lock()
                .expect("upload log poisoned")
                .push(path.to_path_buf());
            Ok(UploadResult {
                http_status: 200,
                scan_id: Some(format!("scan-{}", self.upload_count())),
                message: "File accepted".to_string(),
            })
        }
    }
}
