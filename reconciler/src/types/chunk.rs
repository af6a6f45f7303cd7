use serde::{Deserialize, Serialize};

use super::job::JobId;

/// Where a trace chunk currently lives.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChunkState {
    /// Still in transient storage, waiting for the migration worker.
    Live,
    /// Migrated to durable storage.
    Persisted,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TraceChunk {
    pub job_id: JobId,
    /// 0-indexed position of the chunk in the trace.
    pub index: u32,
    pub state: ChunkState,
}

impl TraceChunk {
    pub fn is_live(&self) -> bool {
        self.state == ChunkState::Live
    }
}
