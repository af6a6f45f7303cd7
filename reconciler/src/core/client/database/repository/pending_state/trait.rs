use async_trait::async_trait;

use crate::core::client::database::error::DatabaseError;
use crate::types::job::JobId;
use crate::types::pending_state::PendingStateRecord;
use crate::types::phase::ReportedPhase;

/// Storage for pending build states, keyed by `(job_id, state, trace_checksum)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PendingStateRepository: Send + Sync {
    /// Insert `record` unless a record with the same key exists, then return whichever record is stored.
    ///
    /// A store that detects the race only through a unique constraint returns
    /// `DatabaseError::ItemAlreadyExists`; callers recover by reading the key back.
    async fn insert_if_absent(&self, record: PendingStateRecord) -> Result<PendingStateRecord, DatabaseError>;

    /// Get the record for an exact key.
    async fn find(
        &self,
        job_id: JobId,
        state: ReportedPhase,
        trace_checksum: &str,
    ) -> Result<Option<PendingStateRecord>, DatabaseError>;

    /// Get the most recently created record for a job, whatever its key.
    async fn find_latest_for_job(&self, job_id: JobId) -> Result<Option<PendingStateRecord>, DatabaseError>;
}
