//! Verdicts and response payloads returned by the Capture API.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use serde_json::Value;

/// Reputation the Capture API reports for a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The service has never seen the sample.
    Unknown,
    /// The sample was judged clean.
    Clean,
    /// The sample was judged malicious.
    Malicious,
    /// The sample is queued for analysis.
    Pending,
    /// Analysis of the sample is in progress.
    Running,
    /// A classification this client does not recognise, kept verbatim.
    Unrecognized(String),
}

impl Verdict {
    /// Map an `analysis_result` value onto a verdict.
    ///
    /// Matching is exact after trimming and ASCII lowercasing, so a compound
    /// value such as `"clean, pending"` is `Unrecognized` rather than matching
    /// two classes at once.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unknown" => Self::Unknown,
            "clean" => Self::Clean,
            "malicious" => Self::Malicious,
            "pending" => Self::Pending,
            "running" => Self::Running,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Lowercase label for the verdict.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "unknown",
            Self::Clean => "clean",
            Self::Malicious => "malicious",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Parsed response of a file report lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictResponse {
    /// Verdict extracted from `analysis_result`.
    pub verdict: Verdict,
    /// HTTP status of the lookup.
    pub http_status: u16,
    /// Full JSON body as returned by the service.
    pub raw: Value,
}

/// Result of a sample upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// HTTP status returned by the scan route.
    pub http_status: u16,
    /// Scan identifier issued on acceptance (HTTP 200).
    pub scan_id: Option<String>,
    /// `verbose_msg` reported by the service.
    pub message: String,
}

impl UploadResult {
    /// Whether the service accepted the sample.
    #[must_use]
    pub const fn accepted(&self) -> bool {
        self.http_status == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_each_known_verdict_exactly() {
        assert_eq!(Verdict::parse("unknown"), Verdict::Unknown);
        assert_eq!(Verdict::parse(" Clean "), Verdict::Clean);
        assert_eq!(Verdict::parse("MALICIOUS"), Verdict::Malicious);
        assert_eq!(Verdict::parse("pending"), Verdict::Pending);
        assert_eq!(Verdict::parse("running"), Verdict::Running);
    }

    #[test]
    fn parse_keeps_compound_and_new_values_unrecognized() {
        assert_eq!(
            Verdict::parse("clean, pending"),
            Verdict::Unrecognized("clean, pending".into())
        );
        assert_eq!(
            Verdict::parse("suspicious"),
            Verdict::Unrecognized("suspicious".into())
        );
        assert_eq!(Verdict::parse("suspicious").to_string(), "suspicious");
    }
}
