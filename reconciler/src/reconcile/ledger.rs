use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::client::database::{DatabaseError, PendingStateRepository};
use crate::types::pending_state::PendingStateRecord;
use crate::types::report::TraceUpdateReport;
use crate::utils::metrics::{TraceMetrics, TraceOperation};

/// Deduplicates pending build states across retried and concurrent updates.
pub struct PendingStateLedger {
    repository: Arc<dyn PendingStateRepository>,
    metrics: Arc<dyn TraceMetrics>,
}

impl PendingStateLedger {
    pub fn new(repository: Arc<dyn PendingStateRepository>, metrics: Arc<dyn TraceMetrics>) -> Self {
        Self { repository, metrics }
    }

    /// Get the pending record for `(job, phase, checksum)`, creating it stamped `now` if this is the first sighting.
    ///
    /// The first writer's `created_at` always wins. A lost insert race is answered by reading the key back; any
    /// other store failure falls back to the job's latest record before giving up.
    pub async fn create_or_fetch(
        &self,
        report: &TraceUpdateReport,
        checksum: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingStateRecord, DatabaseError> {
        let candidate = PendingStateRecord::new(report.job_id, report.phase, checksum, report.failure_reason, now);

        match self.repository.insert_if_absent(candidate).await {
            Ok(record) => Ok(record),
            Err(err) if err.is_duplicate_key() => {
                self.metrics.increment_trace_operation(TraceOperation::Conflict);
                debug!(job_id = report.job_id, phase = %report.phase, "Pending state insert raced, reading it back");

                match self.repository.find(report.job_id, report.phase, checksum).await? {
                    Some(record) => Ok(record),
                    None => self.latest_or(report, err).await,
                }
            }
            Err(err) => {
                warn!(job_id = report.job_id, error = %err, "Pending state dedup failed, using latest record");
                self.latest_or(report, err).await
            }
        }
    }

    async fn latest_or(
        &self,
        report: &TraceUpdateReport,
        original: DatabaseError,
    ) -> Result<PendingStateRecord, DatabaseError> {
        match self.repository.find_latest_for_job(report.job_id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(original),
            Err(fallback) => {
                warn!(job_id = report.job_id, error = %fallback, "Pending state fallback read failed");
                Err(original)
            }
        }
    }
}
