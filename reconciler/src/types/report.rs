use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::job::JobId;
use super::params::CoordinatorConfig;
use super::phase::{FailureReason, ReportedPhase};

/// A build-state update as it arrives from a runner, before any validation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceUpdateRequest {
    pub state: String,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    /// Full trace content the runner wants to replace the stored trace with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Bytes>,
}

impl TraceUpdateRequest {
    pub fn new(state: impl Into<String>) -> Self {
        Self { state: state.into(), ..Default::default() }
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    pub fn with_trace(mut self, trace: impl Into<Bytes>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// A validated update for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceUpdateReport {
    pub job_id: JobId,
    pub phase: ReportedPhase,
    pub failure_reason: Option<FailureReason>,
    pub checksum: Option<String>,
}

impl TraceUpdateReport {
    pub fn parse(job_id: JobId, request: &TraceUpdateRequest) -> Result<Self, strum::ParseError> {
        let phase = request.state.trim().parse::<ReportedPhase>()?;
        let checksum = request.checksum.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
        let failure_reason = request.failure_reason.as_deref().map(FailureReason::parse_lenient);

        Ok(Self { job_id, phase, failure_reason, checksum })
    }

    /// The checksum to defer on, when this update is allowed to wait for trace migration.
    pub fn deferrable_checksum(&self, config: &CoordinatorConfig) -> Option<&str> {
        if !self.phase.may_defer() || !config.deferral_enabled {
            return None;
        }
        self.checksum.as_deref()
    }
}
