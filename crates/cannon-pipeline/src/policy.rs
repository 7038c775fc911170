//! Verdict-to-action decision.
//!
//! The decision is a pure function of the verdict and the `ignore_verdict`
//! flag; it never touches the network or the filesystem.

use cannon_capture::Verdict;
use serde::Serialize;

/// What to do with a sample once its verdict is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Upload the sample for scanning.
    Submit,
    /// Already judged clean.
    SkipClean,
    /// Already judged malicious.
    SkipMalicious,
    /// Queued for analysis.
    SkipPending,
    /// Analysis in progress.
    SkipRunning,
    /// Classification this client does not recognise.
    SkipUnrecognized,
}

/// Why a sample was not uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Verdict was `clean`.
    Clean,
    /// Verdict was `malicious`.
    Malicious,
    /// Verdict was `pending`.
    Pending,
    /// Verdict was `running`.
    Running,
    /// Verdict was not one of the known classes.
    Unrecognized,
}

impl SkipReason {
    /// Lowercase label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Malicious => "malicious",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl Action {
    /// Skip reason carried by this action, `None` for [`Action::Submit`].
    #[must_use]
    pub const fn skip_reason(self) -> Option<SkipReason> {
        match self {
            Self::Submit => None,
            Self::SkipClean => Some(SkipReason::Clean),
            Self::SkipMalicious => Some(SkipReason::Malicious),
            Self::SkipPending => Some(SkipReason::Pending),
            Self::SkipRunning => Some(SkipReason::Running),
            Self::SkipUnrecognized => Some(SkipReason::Unrecognized),
        }
    }
}

/// Decide whether to upload a sample.
///
/// With `ignore_verdict` set every sample is submitted. Otherwise only
/// never-seen (`unknown`) samples are.
#[must_use]
pub const fn decide(verdict: &Verdict, ignore_verdict: bool) -> Action {
    if ignore_verdict {
        return Action::Submit;
    }
    match verdict {
        Verdict::Unknown => Action::Submit,
        Verdict::Clean => Action::SkipClean,
        Verdict::Malicious => Action::SkipMalicious,
        Verdict::Pending => Action::SkipPending,
        Verdict::Running => Action::SkipRunning,
        Verdict::Unrecognized(_) => Action::SkipUnrecognized,
    }
}
