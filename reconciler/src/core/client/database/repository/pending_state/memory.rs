use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::r#trait::PendingStateRepository;
use crate::core::client::database::error::DatabaseError;
use crate::types::job::JobId;
use crate::types::pending_state::PendingStateRecord;
use crate::types::phase::ReportedPhase;

type PendingStateKey = (JobId, ReportedPhase, String);

/// Process-local ledger store. The mutex makes insert-if-absent atomic, so it never reports a conflict.
#[derive(Debug, Default)]
pub struct InMemoryPendingStateRepository {
    records: Mutex<HashMap<PendingStateKey, PendingStateRecord>>,
}

impl InMemoryPendingStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl PendingStateRepository for InMemoryPendingStateRepository {
    async fn insert_if_absent(&self, record: PendingStateRecord) -> Result<PendingStateRecord, DatabaseError> {
        let key = (record.job_id, record.state, record.trace_checksum.clone());
        let mut records = self.records.lock().await;
        Ok(records.entry(key).or_insert(record).clone())
    }

    async fn find(
        &self,
        job_id: JobId,
        state: ReportedPhase,
        trace_checksum: &str,
    ) -> Result<Option<PendingStateRecord>, DatabaseError> {
        let records = self.records.lock().await;
        Ok(records.get(&(job_id, state, trace_checksum.to_string())).cloned())
    }

    async fn find_latest_for_job(&self, job_id: JobId) -> Result<Option<PendingStateRecord>, DatabaseError> {
        let records = self.records.lock().await;
        Ok(records.values().filter(|record| record.job_id == job_id).max_by_key(|record| record.created_at).cloned())
    }
}
