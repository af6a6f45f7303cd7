use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, SubsecRound, Utc};
use mockall::predicate::eq;
use mongodb::bson;
use rstest::*;

use crate::core::client::database::{DatabaseError, InMemoryPendingStateRepository, MockPendingStateRepository};
use crate::reconcile::ledger::PendingStateLedger;
use crate::tests::common::{RecordingTraceMetrics, JOB_ID};
use crate::types::pending_state::PendingStateRecord;
use crate::types::phase::{FailureReason, ReportedPhase};
use crate::types::report::TraceUpdateReport;
use crate::utils::metrics::{MockTraceMetrics, TraceOperation};

const CHECKSUM: &str = "sha3-256:abc";

#[fixture]
fn success_report() -> TraceUpdateReport {
    TraceUpdateReport {
        job_id: JOB_ID,
        phase: ReportedPhase::Success,
        failure_reason: None,
        checksum: Some(CHECKSUM.to_string()),
    }
}

fn stored_record(age: Duration) -> PendingStateRecord {
    PendingStateRecord::new(JOB_ID, ReportedPhase::Success, CHECKSUM, None, Utc::now() - age)
}

#[rstest]
#[tokio::test]
async fn create_or_fetch_keeps_first_created_at(success_report: TraceUpdateReport) {
    let repository = Arc::new(InMemoryPendingStateRepository::new());
    let ledger = PendingStateLedger::new(repository.clone(), Arc::new(RecordingTraceMetrics::default()));

    let first_seen = Utc::now() - Duration::seconds(30);
    let first = ledger.create_or_fetch(&success_report, CHECKSUM, first_seen).await.unwrap();
    let retried = ledger.create_or_fetch(&success_report, CHECKSUM, Utc::now()).await.unwrap();

    assert_eq!(first.created_at, first_seen.trunc_subsecs(3));
    assert_eq!(retried, first);
    assert_eq!(repository.len().await, 1);
}

/// Tests that the record handed to the first writer is exactly what a store round trip gives later readers.
#[rstest]
#[tokio::test]
async fn created_at_matches_what_the_store_keeps(success_report: TraceUpdateReport) {
    let ledger = PendingStateLedger::new(
        Arc::new(InMemoryPendingStateRepository::new()),
        Arc::new(RecordingTraceMetrics::default()),
    );

    let first = ledger.create_or_fetch(&success_report, CHECKSUM, Utc::now()).await.unwrap();
    let stored: PendingStateRecord = bson::from_document(bson::to_document(&first).unwrap()).unwrap();

    assert_eq!(stored, first);
    assert_eq!(first.created_at.timestamp_subsec_nanos() % 1_000_000, 0);
}

#[rstest]
#[tokio::test]
async fn create_or_fetch_separates_checksums_and_phases(success_report: TraceUpdateReport) {
    let repository = Arc::new(InMemoryPendingStateRepository::new());
    let ledger = PendingStateLedger::new(repository.clone(), Arc::new(RecordingTraceMetrics::default()));
    let failed_report = TraceUpdateReport {
        phase: ReportedPhase::Failed,
        failure_reason: Some(FailureReason::ScriptFailure),
        ..success_report.clone()
    };

    ledger.create_or_fetch(&success_report, CHECKSUM, Utc::now()).await.unwrap();
    ledger.create_or_fetch(&success_report, "sha3-256:other", Utc::now()).await.unwrap();
    let failed = ledger.create_or_fetch(&failed_report, CHECKSUM, Utc::now()).await.unwrap();

    assert_eq!(repository.len().await, 3);
    assert_eq!(failed.failure_reason, Some(FailureReason::ScriptFailure));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_create_or_fetch_yields_one_record(success_report: TraceUpdateReport) {
    let repository = Arc::new(InMemoryPendingStateRepository::new());
    let metrics = Arc::new(RecordingTraceMetrics::default());
    let ledger = Arc::new(PendingStateLedger::new(repository.clone(), metrics.clone()));

    let calls = (0..16).map(|attempt| {
        let ledger = ledger.clone();
        let report = success_report.clone();
        tokio::spawn(async move {
            let now = Utc::now() + Duration::milliseconds(attempt);
            ledger.create_or_fetch(&report, CHECKSUM, now).await.unwrap()
        })
    });
    let records: Vec<PendingStateRecord> =
        futures::future::join_all(calls).await.into_iter().map(|joined| joined.unwrap()).collect();

    assert_eq!(repository.len().await, 1);
    assert!(records.iter().all(|record| record.created_at == records[0].created_at));
    assert_eq!(metrics.count(TraceOperation::Conflict), 0);
}

#[rstest]
#[tokio::test]
async fn lost_insert_race_reads_the_winner_back(success_report: TraceUpdateReport) {
    let winner = stored_record(Duration::seconds(5));
    let expected = winner.clone();

    let mut repository = MockPendingStateRepository::new();
    repository
        .expect_insert_if_absent()
        .times(1)
        .returning(|_| Err(DatabaseError::ItemAlreadyExists("pending state".to_string())));
    repository.expect_find().times(1).returning(move |_, _, _| Ok(Some(winner.clone())));
    repository.expect_find_latest_for_job().never();

    let mut metrics = MockTraceMetrics::new();
    metrics.expect_increment_trace_operation().with(eq(TraceOperation::Conflict)).times(1).return_const(());

    let ledger = PendingStateLedger::new(Arc::new(repository), Arc::new(metrics));
    let record = ledger.create_or_fetch(&success_report, CHECKSUM, Utc::now()).await.unwrap();

    assert_eq!(record, expected);
}

#[rstest]
#[tokio::test]
async fn store_failure_falls_back_to_latest_record(success_report: TraceUpdateReport) {
    let latest = stored_record(Duration::seconds(42));
    let expected = latest.clone();

    let mut repository = MockPendingStateRepository::new();
    repository
        .expect_insert_if_absent()
        .returning(|_| Err(DatabaseError::FailedToSerializeDocument("boom".to_string())));
    repository.expect_find().never();
    repository.expect_find_latest_for_job().with(eq(JOB_ID)).times(1).returning(move |_| Ok(Some(latest.clone())));

    let metrics = Arc::new(RecordingTraceMetrics::default());
    let ledger = PendingStateLedger::new(Arc::new(repository), metrics.clone());
    let record = ledger.create_or_fetch(&success_report, CHECKSUM, Utc::now()).await.unwrap();

    assert_eq!(record, expected);
    assert!(metrics.operations().is_empty());
}

#[rstest]
#[tokio::test]
async fn store_failure_without_fallback_returns_original_error(success_report: TraceUpdateReport) {
    let mut repository = MockPendingStateRepository::new();
    repository
        .expect_insert_if_absent()
        .returning(|_| Err(DatabaseError::FailedToSerializeDocument("boom".to_string())));
    repository
        .expect_find_latest_for_job()
        .returning(|_| Err(DatabaseError::ItemNotFound("unreachable".to_string())));

    let ledger = PendingStateLedger::new(Arc::new(repository), Arc::new(RecordingTraceMetrics::default()));
    let result = ledger.create_or_fetch(&success_report, CHECKSUM, Utc::now()).await;

    assert_matches!(result, Err(DatabaseError::FailedToSerializeDocument(message)) if message == "boom");
}

#[rstest]
#[tokio::test]
async fn lost_race_with_vanished_record_uses_latest(success_report: TraceUpdateReport) {
    let latest = stored_record(Duration::seconds(1));
    let expected = latest.clone();

    let mut repository = MockPendingStateRepository::new();
    repository
        .expect_insert_if_absent()
        .returning(|_| Err(DatabaseError::ItemAlreadyExists("pending state".to_string())));
    repository.expect_find().returning(|_, _, _| Ok(None));
    repository.expect_find_latest_for_job().times(1).returning(move |_| Ok(Some(latest.clone())));

    let metrics = Arc::new(RecordingTraceMetrics::default());
    let ledger = PendingStateLedger::new(Arc::new(repository), metrics.clone());
    let record = ledger.create_or_fetch(&success_report, CHECKSUM, Utc::now()).await.unwrap();

    assert_eq!(record, expected);
    assert_eq!(metrics.count(TraceOperation::Conflict), 1);
}
