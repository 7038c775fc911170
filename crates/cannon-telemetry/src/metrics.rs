//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters an operator needs to judge a load run: lookups,
//!   uploads, per-unit outcomes and failures, and in-flight units.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome labels recorded by [`Metrics::inc_unit_outcome`].
const OUTCOME_LABELS: [&str; 3] = ["uploaded", "skipped", "failed"];

/// Prometheus-backed metrics registry shared by the pipeline components.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    lookups_total: IntCounterVec,
    uploads_total: IntCounterVec,
    unit_outcomes_total: IntCounterVec,
    unit_failures_total: IntCounterVec,
    active_units: IntGauge,
}

/// Snapshot of selected gauges and counters for run summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Units that finished with an upload.
    pub uploaded_total: u64,
    /// Units that finished without uploading.
    pub skipped_total: u64,
    /// Units that failed at any stage.
    pub failed_total: u64,
    /// Units currently in flight.
    pub active_units: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let lookups_total = counter_vec(
            "capture_lookups_total",
            "Verdict lookups issued by response status",
            &["status"],
        )?;
        let uploads_total = counter_vec(
            "capture_uploads_total",
            "Sample uploads issued by response status",
            &["status"],
        )?;
        let unit_outcomes_total = counter_vec(
            "unit_outcomes_total",
            "Processed file units by terminal outcome",
            &["outcome"],
        )?;
        let unit_failures_total = counter_vec(
            "unit_failures_total",
            "Failed file units by stage and error kind",
            &["stage", "kind"],
        )?;
        let active_units = IntGauge::with_opts(Opts::new(
            "active_units",
            "File units currently being processed",
        ))
        .map_err(|source| TelemetryError::CreateMetric {
            name: "active_units",
            source,
        })?;

        register(&registry, "capture_lookups_total", &lookups_total)?;
        register(&registry, "capture_uploads_total", &uploads_total)?;
        register(&registry, "unit_outcomes_total", &unit_outcomes_total)?;
        register(&registry, "unit_failures_total", &unit_failures_total)?;
        register(&registry, "active_units", &active_units)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                lookups_total,
                uploads_total,
                unit_outcomes_total,
                unit_failures_total,
                active_units,
            }),
        })
    }

    /// Count a verdict lookup; `status` is the HTTP status or an error label.
    pub fn inc_lookup(&self, status: &str) {
        self.inner.lookups_total.with_label_values(&[status]).inc();
    }

    /// Count a sample upload; `status` is the HTTP status or an error label.
    pub fn inc_upload(&self, status: &str) {
        self.inner.uploads_total.with_label_values(&[status]).inc();
    }

    /// Count a unit reaching a terminal outcome (`uploaded`, `skipped`, `failed`).
    pub fn inc_unit_outcome(&self, outcome: &str) {
        self.inner
            .unit_outcomes_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count a failed unit by stage and error kind.
    pub fn inc_unit_failure(&self, stage: &str, kind: &str) {
        self.inner
            .unit_failures_total
            .with_label_values(&[stage, kind])
            .inc();
    }

    /// Mark a unit as started.
    pub fn unit_started(&self) {
        self.inner.active_units.inc();
    }

    /// Mark a unit as finished.
    pub fn unit_finished(&self) {
        self.inner.active_units.dec();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Encode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::NotUtf8 { source })
    }

    /// Take a point-in-time snapshot of the outcome counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let [uploaded, skipped, failed] = OUTCOME_LABELS.map(|label| {
            self.inner
                .unit_outcomes_total
                .with_label_values(&[label])
                .get()
        });
        MetricsSnapshot {
            uploaded_total: uploaded,
            skipped_total: skipped,
            failed_total: failed,
            active_units: self.inner.active_units.get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::CreateMetric { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::RegisterMetric { name, source })
}
