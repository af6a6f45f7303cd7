pub mod error;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
pub use error::StorageError;
pub use memory::{trace_checksum, InMemoryTraceStorage};

use crate::types::chunk::TraceChunk;
use crate::types::job::JobId;

/// Chunked trace storage as seen by the reconciler.
///
/// Chunk state is owned by the migration worker behind this trait; the reconciler only reads it
/// and asks for migrations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TraceStorage: Send + Sync {
    /// Replace the whole trace of a job.
    async fn overwrite(&self, job_id: JobId, data: Bytes) -> Result<(), StorageError>;

    /// All chunks of a job's trace, ordered by index.
    async fn list_chunks(&self, job_id: JobId) -> Result<Vec<TraceChunk>, StorageError>;

    /// Checksum of the stored trace, in the same format runners report it.
    async fn compute_checksum(&self, job_id: JobId) -> Result<String, StorageError>;

    /// Ask the migration worker to move a live chunk to durable storage. Does not wait for it.
    async fn schedule_migration(&self, chunk: &TraceChunk) -> Result<(), StorageError>;
}
