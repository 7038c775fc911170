//! Telemetry error type.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Failures while installing logging or maintaining metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("tracing subscriber could not be installed")]
    Subscriber {
        /// Underlying installation error.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
    /// A collector had an invalid name, help text, or label set.
    #[error("metric {name} could not be created")]
    CreateMetric {
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// A collector clashed with one already in the registry.
    #[error("metric {name} could not be registered")]
    RegisterMetric {
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// The text exposition could not be produced.
    #[error("metrics exposition could not be encoded")]
    Encode {
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// The encoder emitted bytes that are not UTF-8.
    #[error("metrics exposition is not UTF-8")]
    NotUtf8 {
        /// Underlying conversion error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn metric_errors_name_the_metric_and_keep_their_source() -> anyhow::Result<()> {
        let create = TelemetryError::CreateMetric {
            name: "capture_lookups_total",
            source: PrometheusError::Msg("bad label".into()),
        };
        assert_eq!(
            create.to_string(),
            "metric capture_lookups_total could not be created"
        );
        assert!(create.source().is_some());

        let register = TelemetryError::RegisterMetric {
            name: "active_units",
            source: PrometheusError::AlreadyReg,
        };
        assert!(register.to_string().contains("active_units"));

        let utf8 = String::from_utf8(vec![0xff])
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected invalid UTF-8"))?;
        let not_utf8 = TelemetryError::NotUtf8 { source: utf8 };
        assert_eq!(not_utf8.to_string(), "metrics exposition is not UTF-8");
        assert!(not_utf8.source().is_some());
        Ok(())
    }
}
