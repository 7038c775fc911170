//! Bounded fan-out of units and repeated passes over a file source.
//!
//! # Design
//!
//! - Every file of a pass gets its own task; a shared semaphore admits at
//!   most `concurrency` of them into the worker at once.
//! - Passes run strictly one after another and each re-enumerates its files
//!   on the blocking pool.
//! - A task that panics still yields exactly one report for its file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::reporter::Reporter;
use crate::source::FileSource;
use crate::worker::{Outcome, UnitReport, UnitWorker};

/// Tally of one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// One-based pass index.
    pub pass: u32,
    /// Files enumerated for the pass.
    pub files: usize,
    /// Units that reached the scan route.
    pub uploaded: usize,
    /// Units skipped because of their verdict.
    pub skipped: usize,
    /// Units that failed or aborted.
    pub failed: usize,
    /// Wall-clock duration of the pass.
    pub elapsed: Duration,
}

impl PassSummary {
    /// Tally `reports` produced by pass `pass`.
    #[must_use]
    pub fn from_reports(pass: u32, reports: &[UnitReport], elapsed: Duration) -> Self {
        let mut summary = Self {
            pass,
            files: reports.len(),
            uploaded: 0,
            skipped: 0,
            failed: 0,
            elapsed,
        };
        for report in reports {
            match report.outcome {
                Outcome::Uploaded { .. } => summary.uploaded += 1,
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::Failed { .. } | Outcome::Aborted { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Drives units through a [`UnitWorker`] with bounded concurrency.
pub struct Scheduler {
    worker: UnitWorker,
    reporter: Arc<dyn Reporter>,
}

impl Scheduler {
    /// Construct a scheduler.
    #[must_use]
    pub fn new(worker: UnitWorker, reporter: Arc<dyn Reporter>) -> Self {
        Self { worker, reporter }
    }

    /// Process `files` as pass `pass`, returning one report per file.
    ///
    /// Reports are handed to the reporter and returned in completion order.
    pub async fn run_batch(&self, pass: u32, files: Vec<PathBuf>) -> Vec<UnitReport> {
        let concurrency = self
            .worker
            .config()
            .concurrency
            .clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut join_set = JoinSet::new();
        let mut pending = HashMap::with_capacity(files.len());
        let mut reports = Vec::with_capacity(files.len());

        debug!(pass, files = files.len(), concurrency, "dispatching units");
        for path in files {
            let worker = self.worker.clone();
            let semaphore = Arc::clone(&semaphore);
            let task_path = path.clone();
            let handle = join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return UnitReport::aborted(task_path, "worker pool closed");
                };
                worker.process(task_path).await
            });
            pending.insert(handle.id(), path);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            let report = match joined {
                Ok((id, report)) => {
                    pending.remove(&id);
                    report
                }
                Err(join_error) => {
                    let path = pending.remove(&join_error.id()).unwrap_or_default();
                    UnitReport::aborted(path, format!("unit task failed: {join_error}"))
                }
            };
            self.reporter.unit_finished(pass, &report);
            reports.push(report);
        }

        reports
    }

    /// Run `pass_count` passes over `source`, returning every report tagged
    /// with its one-based pass index.
    ///
    /// A pass whose enumeration fails is reported and counted as empty; the
    /// remaining passes still run.
    pub async fn run_passes(&self, source: Arc<dyn FileSource>) -> Vec<(u32, UnitReport)> {
        let pass_count = self.worker.config().pass_count;
        let mut all = Vec::new();

        for pass in 1..=pass_count {
            let started = Instant::now();
            let files = match list_files(Arc::clone(&source)).await {
                Ok(files) => files,
                Err(err) => {
                    self.reporter.enumeration_failed(pass, &err);
                    Vec::new()
                }
            };
            info!(pass, pass_count, files = files.len(), "starting pass");

            let reports = self.run_batch(pass, files).await;
            let summary = PassSummary::from_reports(pass, &reports, started.elapsed());
            self.reporter.pass_finished(&summary);
            all.extend(reports.into_iter().map(|report| (pass, report)));
        }

        all
    }
}

async fn list_files(source: Arc<dyn FileSource>) -> PipelineResult<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || source.files())
        .await
        .map_err(|err| PipelineError::ListingTask { source: err })?
}
