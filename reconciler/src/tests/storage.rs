use assert_matches::assert_matches;
use bytes::Bytes;
use rstest::*;

use crate::core::client::storage::memory::CHUNK_SIZE;
use crate::core::client::storage::{trace_checksum, InMemoryTraceStorage, StorageError, TraceStorage};
use crate::tests::common::JOB_ID;
use crate::types::chunk::{ChunkState, TraceChunk};

#[rstest]
#[tokio::test]
async fn overwrite_replaces_trace_with_live_chunks() {
    let storage = InMemoryTraceStorage::new();
    storage.append(JOB_ID, &b"old"[..]).await;
    storage.persist(JOB_ID, 0).await.unwrap();

    let trace = Bytes::from(vec![b'x'; CHUNK_SIZE + 10]);
    storage.overwrite(JOB_ID, trace.clone()).await.unwrap();

    let chunks = storage.list_chunks(JOB_ID).await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(TraceChunk::is_live));
    assert_eq!(storage.content(JOB_ID).await, trace);
    assert_eq!(storage.compute_checksum(JOB_ID).await.unwrap(), trace_checksum([trace.as_ref()]));
}

#[rstest]
#[tokio::test]
async fn overwrite_drops_stale_migration_requests() {
    let storage = InMemoryTraceStorage::new();
    let index = storage.append(JOB_ID, &b"old"[..]).await;
    storage.schedule_migration(&TraceChunk { job_id: JOB_ID, index, state: ChunkState::Live }).await.unwrap();

    storage.overwrite(JOB_ID, Bytes::from_static(b"new")).await.unwrap();

    assert!(storage.scheduled_migrations(JOB_ID).await.is_empty());
}

#[rstest]
#[tokio::test]
async fn scheduling_unknown_chunk_fails() {
    let storage = InMemoryTraceStorage::new();

    let result = storage.schedule_migration(&TraceChunk { job_id: JOB_ID, index: 3, state: ChunkState::Live }).await;

    assert_matches!(result, Err(StorageError::ChunkNotFound { job_id: JOB_ID, index: 3 }));
}

#[rstest]
#[tokio::test]
async fn appended_chunks_are_indexed_in_order() {
    let storage = InMemoryTraceStorage::new();

    assert_eq!(storage.append(JOB_ID, &b"a"[..]).await, 0);
    assert_eq!(storage.append(JOB_ID, &b"b"[..]).await, 1);
    assert_eq!(storage.append(JOB_ID + 1, &b"c"[..]).await, 0);
    assert_eq!(storage.content(JOB_ID).await, Bytes::from_static(b"ab"));
}
