//! Sinks for unit outcomes and pass summaries.

use std::sync::{Mutex, PoisonError};

use cannon_telemetry::Metrics;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::scheduler::PassSummary;
use crate::worker::{Outcome, UnitReport};

/// Receives outcomes as units finish. Implementations must not panic.
pub trait Reporter: Send + Sync {
    /// Called once per finished unit, in completion order.
    fn unit_finished(&self, pass: u32, report: &UnitReport);

    /// Called once per pass after its last unit.
    fn pass_finished(&self, _summary: &PassSummary) {}

    /// Called when a pass could not enumerate its files.
    fn enumeration_failed(&self, _pass: u32, _error: &PipelineError) {}
}

/// Operator-facing reporter that emits one tracing event per outcome.
#[derive(Clone, Default)]
pub struct TracingReporter {
    metrics: Option<Metrics>,
}

impl TracingReporter {
    /// Reporter without metrics.
    #[must_use]
    pub const fn new() -> Self {
        Self { metrics: None }
    }

    /// Count outcomes and failures on `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn record(&self, outcome: &Outcome) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.inc_unit_outcome(outcome.label());
        match outcome {
            Outcome::Failed { stage, kind, .. } => {
                metrics.inc_unit_failure(stage.as_str(), kind.as_str());
            }
            Outcome::Aborted { .. } => metrics.inc_unit_failure("worker", "aborted"),
            Outcome::Uploaded { .. } | Outcome::Skipped { .. } => {}
        }
    }
}

impl Reporter for TracingReporter {
    fn unit_finished(&self, pass: u32, report: &UnitReport) {
        self.record(&report.outcome);

        let file = report.file_name();
        let sha256 = report.digest.as_deref().unwrap_or("-");
        let size_bytes = report.size_bytes.unwrap_or_default();
        let verdict = report
            .verdict
            .as_ref()
            .map_or("-", cannon_capture::Verdict::as_str);

        match &report.outcome {
            Outcome::Uploaded {
                scan_id: Some(scan_id),
                http_status,
                message,
            } => info!(
                pass,
                file = %file,
                size_bytes,
                sha256,
                verdict,
                http_status,
                scan_id = %scan_id,
                "sample submitted: {message}"
            ),
            Outcome::Uploaded {
                scan_id: None,
                http_status,
                message,
            } => warn!(
                pass,
                file = %file,
                size_bytes,
                sha256,
                verdict,
                http_status,
                "sample rejected by Capture API: {message}"
            ),
            Outcome::Skipped { reason } => info!(
                pass,
                file = %file,
                sha256,
                verdict,
                reason = reason.as_str(),
                "sample skipped: file is {verdict}"
            ),
            Outcome::Failed {
                stage,
                kind,
                message,
            } => warn!(
                pass,
                file = %file,
                sha256,
                stage = stage.as_str(),
                kind = kind.as_str(),
                error = %message,
                "sample failed"
            ),
            Outcome::Aborted { message } => error!(
                pass,
                file = %file,
                error = %message,
                "sample task aborted"
            ),
        }
    }

    fn pass_finished(&self, summary: &PassSummary) {
        info!(
            pass = summary.pass,
            files = summary.files,
            uploaded = summary.uploaded,
            skipped = summary.skipped,
            failed = summary.failed,
            elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            "pass completed"
        );
    }

    fn enumeration_failed(&self, pass: u32, error: &PipelineError) {
        error!(pass, error = %error, "failed to enumerate samples; pass is empty");
    }
}

/// Reporter that keeps everything in memory.
#[derive(Default)]
pub struct CollectingReporter {
    units: Mutex<Vec<(u32, UnitReport)>>,
    passes: Mutex<Vec<PassSummary>>,
}

impl CollectingReporter {
    /// Empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit reports received so far, tagged with their pass.
    #[must_use]
    pub fn units(&self) -> Vec<(u32, UnitReport)> {
        self.units
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pass summaries received so far.
    #[must_use]
    pub fn passes(&self) -> Vec<PassSummary> {
        self.passes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Reporter for CollectingReporter {
    fn unit_finished(&self, pass: u32, report: &UnitReport) {
        self.units
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pass, report.clone()));
    }

    fn pass_finished(&self, summary: &PassSummary) {
        self.passes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SkipReason;
    use crate::worker::Stage;
    use anyhow::Result;
    use cannon_capture::ErrorKind;
    use std::path::PathBuf;
    use std::time::Duration;

    fn report(outcome: Outcome) -> UnitReport {
        UnitReport {
            path: PathBuf::from("/samples/a.bin"),
            digest: Some("ab".repeat(32)),
            size_bytes: Some(4),
            verdict: None,
            outcome,
        }
    }

    #[test]
    fn tracing_reporter_counts_outcomes_and_failures() -> Result<()> {
        let metrics = Metrics::new()?;
        let reporter = TracingReporter::new().with_metrics(metrics.clone());

        reporter.unit_finished(
            1,
            &report(Outcome::Skipped {
                reason: SkipReason::Clean,
            }),
        );
        reporter.unit_finished(
            1,
            &report(Outcome::Failed {
                stage: Stage::Uploading,
                kind: ErrorKind::Timeout,
                message: "upload sample timed out".into(),
            }),
        );
        reporter.unit_finished(
            1,
            &report(Outcome::Uploaded {
                scan_id: None,
                http_status: 413,
                message: "File too large".into(),
            }),
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.skipped_total, 1);
        assert_eq!(snapshot.failed_total, 1);
        assert_eq!(snapshot.uploaded_total, 1);
        assert!(metrics.render()?.contains("stage=\"uploading\""));
        Ok(())
    }

    #[test]
    fn collecting_reporter_keeps_pass_tags() {
        let reporter = CollectingReporter::new();
        reporter.unit_finished(
            2,
            &report(Outcome::Skipped {
                reason: SkipReason::Pending,
            }),
        );
        reporter.pass_finished(&PassSummary {
            pass: 2,
            files: 1,
            uploaded: 0,
            skipped: 1,
            failed: 0,
            elapsed: Duration::from_millis(3),
        });

        let units = reporter.units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].0, 2);
        assert_eq!(reporter.passes()[0].skipped, 1);
    }
}
