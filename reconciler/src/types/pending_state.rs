use chrono::{DateTime, Duration, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use super::job::JobId;
use super::phase::{FailureReason, ReportedPhase};

/// First sighting of a `(job, state, checksum)` report.
///
/// `created_at` belongs to the first writer and is never overwritten by retries, so backoff keeps converging.
/// It is held at millisecond precision, the resolution of a BSON datetime, so the first writer and every
/// later reader see the same instant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PendingStateRecord {
    pub job_id: JobId,
    pub state: ReportedPhase,
    pub trace_checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl PendingStateRecord {
    pub fn new(
        job_id: JobId,
        state: ReportedPhase,
        trace_checksum: impl Into<String>,
        failure_reason: Option<FailureReason>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let created_at = created_at.trunc_subsecs(3);
        Self { job_id, state, trace_checksum: trace_checksum.into(), failure_reason, created_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// True once waiting for this record has lasted longer than `timeout`.
    pub fn is_outdated(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.age(now) > timeout
    }
}
