//! Renderers for the configuration banner and the end-of-run summary.

use std::fmt::Write as _;

use cannon_config::BatchConfig;
use cannon_pipeline::{Outcome, UnitReport};
use cannon_telemetry::MetricsSnapshot;

pub(crate) fn render_config_summary(config: &BatchConfig, run_id: &str) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "run id: {run_id}");
    let _ = writeln!(text, "malware directory: {}", config.directory.display());
    let _ = writeln!(text, "capture api server: {}", config.server_url);
    let _ = writeln!(text, "capture api serial: {}", config.serial);
    let _ = writeln!(text, "capture api key: {}", config.masked_api_key());
    let _ = writeln!(text, "ignore verdict: {}", yes_no(config.ignore_verdict));
    let _ = writeln!(text, "number of passes: {}", config.pass_count);
    let _ = writeln!(text, "number of threads: {}", config.concurrency);
    let _ = writeln!(
        text,
        "request timeout: {}s",
        config.request_timeout.as_secs()
    );
    let _ = write!(
        text,
        "verify certificates: {}",
        yes_no(!config.accept_invalid_certs)
    );
    text
}

pub(crate) fn render_run_summary(
    outcomes: &[(u32, UnitReport)],
    snapshot: &MetricsSnapshot,
) -> String {
    let mut uploaded_bytes = 0_u64;
    let mut rejected = 0_usize;
    for (_, report) in outcomes {
        if let Outcome::Uploaded { scan_id, .. } = &report.outcome {
            uploaded_bytes += report.size_bytes.unwrap_or_default();
            if scan_id.is_none() {
                rejected += 1;
            }
        }
    }

    let mut text = String::new();
    let _ = writeln!(text, "units processed: {}", outcomes.len());
    let _ = writeln!(
        text,
        "uploaded: {} ({}, {rejected} rejected)",
        snapshot.uploaded_total,
        format_bytes(uploaded_bytes)
    );
    let _ = writeln!(text, "skipped: {}", snapshot.skipped_total);
    let _ = write!(text, "failed: {}", snapshot.failed_total);
    text
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    let value = bytes_to_f64(bytes);
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn bytes_to_f64(value: u64) -> f64 {
    let high = u32::try_from(value >> 32).unwrap_or(u32::MAX);
    let low = u32::try_from(value & 0xFFFF_FFFF).unwrap_or(u32::MAX);
    f64::from(high) * 4_294_967_296.0 + f64::from(low)
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cannon_pipeline::SkipReason;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn config() -> BatchConfig {
        BatchConfig {
            directory: PathBuf::from("malware_files"),
            server_url: "https://capture.example".parse().expect("valid URL"),
            serial: "C0EAE4000000".into(),
            api_key: "0123456789abcdef".into(),
            ignore_verdict: false,
            pass_count: 2,
            concurrency: 5,
            request_timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }

    fn report(name: &str, size: u64, outcome: Outcome) -> UnitReport {
        UnitReport {
            path: Path::new("malware_files").join(name),
            digest: Some("00".repeat(32)),
            size_bytes: Some(size),
            verdict: None,
            outcome,
        }
    }

    #[test]
    fn config_summary_masks_the_api_key() {
        let text = render_config_summary(&config(), "run-7");
        assert!(text.contains("capture api key: ************cdef"));
        assert!(!text.contains("0123456789abcdef"));
        assert!(text.contains("number of passes: 2"));
        assert!(text.contains("verify certificates: no"));
    }

    #[test]
    fn run_summary_totals_uploads_and_rejections() {
        let outcomes = vec![
            (
                1,
                report(
                    "a.bin",
                    2048,
                    Outcome::Uploaded {
                        scan_id: Some("scan-1".into()),
                        http_status: 200,
                        message: "queued".into(),
                    },
                ),
            ),
            (
                1,
                report(
                    "b.bin",
                    1024,
                    Outcome::Uploaded {
                        scan_id: None,
                        http_status: 413,
                        message: "too large".into(),
                    },
                ),
            ),
            (
                2,
                report(
                    "c.bin",
                    10,
                    Outcome::Skipped {
                        reason: SkipReason::Clean,
                    },
                ),
            ),
        ];
        let snapshot = MetricsSnapshot {
            uploaded_total: 2,
            skipped_total: 1,
            failed_total: 0,
            active_units: 0,
        };

        let text = render_run_summary(&outcomes, &snapshot);
        assert!(text.contains("units processed: 3"));
        assert!(text.contains("uploaded: 2 (3.00 KiB, 1 rejected)"));
        assert!(text.ends_with("failed: 0"));
    }

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }
}
