use std::sync::Arc;

use tracing::debug;

use crate::core::client::storage::{StorageError, TraceStorage};
use crate::types::chunk::TraceChunk;
use crate::types::job::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// These chunks still live in transient storage.
    Pending(Vec<TraceChunk>),
    /// Nothing left to migrate.
    Persisted { chunk_count: usize },
}

impl MigrationStatus {
    /// Every chunk is durable and there is at least one of them.
    pub fn is_finalized(&self) -> bool {
        matches!(self, MigrationStatus::Persisted { chunk_count } if *chunk_count > 0)
    }
}

/// Tells whether a job's trace still has live chunks and asks for them to be migrated.
pub struct ChunkMigrationGate {
    storage: Arc<dyn TraceStorage>,
}

impl ChunkMigrationGate {
    pub fn new(storage: Arc<dyn TraceStorage>) -> Self {
        Self { storage }
    }

    pub async fn status(&self, job_id: JobId) -> Result<MigrationStatus, StorageError> {
        let chunks = self.storage.list_chunks(job_id).await?;
        let chunk_count = chunks.len();
        let live: Vec<TraceChunk> = chunks.into_iter().filter(TraceChunk::is_live).collect();

        if live.is_empty() {
            Ok(MigrationStatus::Persisted { chunk_count })
        } else {
            Ok(MigrationStatus::Pending(live))
        }
    }

    /// Queue every live chunk for migration without waiting for it.
    pub async fn schedule(&self, live: &[TraceChunk]) -> Result<(), StorageError> {
        for chunk in live {
            self.storage.schedule_migration(chunk).await?;
        }
        if let Some(first) = live.first() {
            debug!(job_id = first.job_id, chunks = live.len(), "Scheduled live trace chunks for migration");
        }
        Ok(())
    }
}
