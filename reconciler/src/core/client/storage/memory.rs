use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bytes::Bytes;
use sha3::{Digest, Sha3_256};
use tokio::sync::Mutex;
use tracing::debug;

use super::{StorageError, TraceStorage};
use crate::types::chunk::{ChunkState, TraceChunk};
use crate::types::job::JobId;

/// Chunk size used when a trace is written in one go.
pub const CHUNK_SIZE: usize = 128 * 1024;

const CHECKSUM_PREFIX: &str = "sha3-256";

/// `sha3-256:<hex>` over the chunk payloads in index order.
pub fn trace_checksum<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = Sha3_256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    format!("{}:{}", CHECKSUM_PREFIX, hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone)]
struct StoredChunk {
    data: Bytes,
    state: ChunkState,
}

/// Trace storage held in memory, with an explicit step standing in for the migration worker.
#[derive(Debug, Default)]
pub struct InMemoryTraceStorage {
    traces: Mutex<HashMap<JobId, BTreeMap<u32, StoredChunk>>>,
    scheduled: Mutex<Vec<(JobId, u32)>>,
}

impl InMemoryTraceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a live chunk and return its index.
    pub async fn append(&self, job_id: JobId, data: impl Into<Bytes>) -> u32 {
        let mut traces = self.traces.lock().await;
        let chunks = traces.entry(job_id).or_default();
        let index = chunks.keys().next_back().map_or(0, |last| last + 1);
        chunks.insert(index, StoredChunk { data: data.into(), state: ChunkState::Live });
        index
    }

    pub async fn persist(&self, job_id: JobId, index: u32) -> Result<(), StorageError> {
        let mut traces = self.traces.lock().await;
        let chunk = traces
            .get_mut(&job_id)
            .and_then(|chunks| chunks.get_mut(&index))
            .ok_or(StorageError::ChunkNotFound { job_id, index })?;
        chunk.state = ChunkState::Persisted;
        Ok(())
    }

    /// Chunks queued for migration, oldest request first.
    pub async fn scheduled_migrations(&self, job_id: JobId) -> Vec<u32> {
        let scheduled = self.scheduled.lock().await;
        scheduled.iter().filter(|(id, _)| *id == job_id).map(|(_, index)| *index).collect()
    }

    /// Persist every scheduled chunk, as the migration worker would.
    pub async fn run_scheduled_migrations(&self) -> Result<usize, StorageError> {
        let pending: Vec<(JobId, u32)> = std::mem::take(&mut *self.scheduled.lock().await);
        for (job_id, index) in &pending {
            self.persist(*job_id, *index).await?;
        }
        Ok(pending.len())
    }

    pub async fn content(&self, job_id: JobId) -> Bytes {
        let traces = self.traces.lock().await;
        let content: Vec<u8> = traces
            .get(&job_id)
            .map(|chunks| chunks.values().flat_map(|chunk| chunk.data.iter().copied()).collect())
            .unwrap_or_default();
        Bytes::from(content)
    }
}

#[async_trait]
impl TraceStorage for InMemoryTraceStorage {
    async fn overwrite(&self, job_id: JobId, data: Bytes) -> Result<(), StorageError> {
        let chunks: BTreeMap<u32, StoredChunk> = data
            .chunks(CHUNK_SIZE)
            .enumerate()
            .map(|(index, part)| (index as u32, StoredChunk { data: data.slice_ref(part), state: ChunkState::Live }))
            .collect();

        debug!(job_id, chunks = chunks.len(), "Trace overwritten");
        self.traces.lock().await.insert(job_id, chunks);
        self.scheduled.lock().await.retain(|(id, _)| *id != job_id);
        Ok(())
    }

    async fn list_chunks(&self, job_id: JobId) -> Result<Vec<TraceChunk>, StorageError> {
        let traces = self.traces.lock().await;
        Ok(traces
            .get(&job_id)
            .map(|chunks| {
                chunks.iter().map(|(index, chunk)| TraceChunk { job_id, index: *index, state: chunk.state }).collect()
            })
            .unwrap_or_default())
    }

    async fn compute_checksum(&self, job_id: JobId) -> Result<String, StorageError> {
        let traces = self.traces.lock().await;
        let checksum = match traces.get(&job_id) {
            Some(chunks) => trace_checksum(chunks.values().map(|chunk| chunk.data.as_ref())),
            None => trace_checksum(std::iter::empty()),
        };
        Ok(checksum)
    }

    async fn schedule_migration(&self, chunk: &TraceChunk) -> Result<(), StorageError> {
        let traces = self.traces.lock().await;
        if !traces.get(&chunk.job_id).is_some_and(|chunks| chunks.contains_key(&chunk.index)) {
            return Err(StorageError::ChunkNotFound { job_id: chunk.job_id, index: chunk.index });
        }
        drop(traces);

        let mut scheduled = self.scheduled.lock().await;
        if !scheduled.contains(&(chunk.job_id, chunk.index)) {
            scheduled.push((chunk.job_id, chunk.index));
        }
        Ok(())
    }
}
