use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The state a runner reports for a job.
///
/// Parsing is the rejection boundary: anything outside this set never reaches the commit path.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportedPhase {
    Running,
    Success,
    Failed,
}

impl ReportedPhase {
    /// Only terminal phases may wait on trace migration. A running job is always touched immediately.
    pub fn may_defer(&self) -> bool {
        !matches!(self, ReportedPhase::Running)
    }
}

/// Why a runner says a job failed.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureReason {
    #[default]
    UnknownFailure,
    ScriptFailure,
    ApiFailure,
    StuckOrTimeoutFailure,
    RunnerSystemFailure,
    MissingDependencyFailure,
    RunnerUnsupported,
    JobExecutionTimeout,
    ArchivedFailure,
    UnmetPrerequisites,
    DataIntegrityFailure,
}

impl FailureReason {
    /// Unrecognised reasons collapse into `UnknownFailure` instead of rejecting the update.
    pub fn parse_lenient(value: &str) -> Self {
        FailureReason::from_str(value.trim()).unwrap_or_default()
    }
}
