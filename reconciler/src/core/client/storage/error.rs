use thiserror::Error;

use crate::types::job::JobId;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Trace chunk {index} of job {job_id} not found")]
    ChunkNotFound { job_id: JobId, index: u32 },

    #[error("Trace storage backend error: {0}")]
    Backend(String),
}
