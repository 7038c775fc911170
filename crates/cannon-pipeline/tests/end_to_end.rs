use std::sync::Arc;

use anyhow::Result;
use cannon_capture::{CaptureClient, REPORT_PATH, SCAN_PATH, Verdict, VerdictService};
use cannon_pipeline::{
    CollectingReporter, DirectorySource, Outcome, Reporter, Scheduler, SkipReason, UnitWorker,
};
use cannon_telemetry::Metrics;
use cannon_test_support::{SampleDir, batch_config, sha256_hex};
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;

#[tokio::test]
async fn unknown_sample_is_uploaded_and_clean_sample_is_skipped() -> Result<()> {
    let samples = SampleDir::new()?;
    samples.write("x.bin", b"never seen before")?;
    samples.write("y.bin", b"already scanned")?;

    let server = MockServer::start_async().await;
    let unknown = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(REPORT_PATH)
                .query_param("sha256", sha256_hex(b"never seen before"));
            then.status(200)
                .json_body(json!({ "analysis_result": "unknown" }));
        })
        .await;
    let clean = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(REPORT_PATH)
                .query_param("sha256", sha256_hex(b"already scanned"));
            then.status(200).json_body(json!({ "analysis_result": "clean" }));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SCAN_PATH)
                .header_exists("authorization")
                .body_includes("never seen before");
            then.status(200).json_body(json!({
                "verbose_msg": "Scan request successfully queued",
                "scan_id": "scan-1"
            }));
        })
        .await;

    let config = Arc::new(batch_config(samples.path(), &server.base_url(), 2)?);
    let client: Arc<dyn VerdictService> =
        Arc::new(CaptureClient::from_config(&config, "end-to-end")?);
    let metrics = Metrics::new()?;
    let reporter = Arc::new(CollectingReporter::new());
    let scheduler = Scheduler::new(
        UnitWorker::new(client, Arc::clone(&config)).with_metrics(metrics.clone()),
        Arc::clone(&reporter) as Arc<dyn Reporter>,
    );

    let outcomes = scheduler
        .run_passes(Arc::new(DirectorySource::new(samples.path())))
        .await;
    assert_eq!(outcomes.len(), 2);

    let x = outcomes
        .iter()
        .find(|(_, report)| report.file_name() == "x.bin")
        .map(|(_, report)| report)
        .ok_or_else(|| anyhow::anyhow!("missing report for x.bin"))?;
    assert_eq!(x.verdict, Some(Verdict::Unknown));
    assert!(matches!(
        &x.outcome,
        Outcome::Uploaded { scan_id: Some(scan_id), http_status: 200, .. } if scan_id == "scan-1"
    ));

    let y = outcomes
        .iter()
        .find(|(_, report)| report.file_name() == "y.bin")
        .map(|(_, report)| report)
        .ok_or_else(|| anyhow::anyhow!("missing report for y.bin"))?;
    assert_eq!(
        y.outcome,
        Outcome::Skipped {
            reason: SkipReason::Clean
        }
    );

    unknown.assert_async().await;
    clean.assert_async().await;
    assert_eq!(upload.hits_async().await, 1);
    assert_eq!(reporter.passes().len(), 1);
    assert_eq!(metrics.snapshot().active_units, 0);
    assert!(metrics.render()?.contains("capture_lookups_total"));
    Ok(())
}

#[tokio::test]
async fn rejected_credentials_fail_every_unit_without_uploads() -> Result<()> {
    let samples = SampleDir::new()?;
    samples.write("a.bin", b"alpha")?;
    samples.write("b.bin", b"bravo")?;

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(REPORT_PATH);
            then.status(401).body("unauthorized");
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path(SCAN_PATH);
            then.status(200);
        })
        .await;

    let config = Arc::new(batch_config(samples.path(), &server.base_url(), 4)?);
    let client: Arc<dyn VerdictService> = Arc::new(CaptureClient::from_config(&config, "auth")?);
    let reporter = Arc::new(CollectingReporter::new());
    let scheduler = Scheduler::new(
        UnitWorker::new(client, Arc::clone(&config)),
        Arc::clone(&reporter) as Arc<dyn Reporter>,
    );

    let outcomes = scheduler
        .run_passes(Arc::new(DirectorySource::new(samples.path())))
        .await;

    assert_eq!(outcomes.len(), 2);
    assert!(
        outcomes
            .iter()
            .all(|(_, report)| report.outcome.label() == "failed")
    );
    assert_eq!(reporter.passes()[0].failed, 2);
    assert_eq!(upload.hits_async().await, 0);
    Ok(())
}
