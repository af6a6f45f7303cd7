use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use opentelemetry::KeyValue;
use tracing::{debug, info, instrument, warn};

use super::backoff::Backoff;
use super::checksum::ChecksumValidator;
use super::lease::{ExclusiveJobLease, LeaseAttempt};
use super::ledger::PendingStateLedger;
use super::migration::{ChunkMigrationGate, MigrationStatus};
use crate::core::client::database::PendingStateRepository;
use crate::core::client::lifecycle::{CommitHooks, JobLifecycle};
use crate::core::client::lock::LockClient;
use crate::core::client::storage::TraceStorage;
use crate::error::ReconcilerResult;
use crate::types::chunk::TraceChunk;
use crate::types::job::Job;
use crate::types::outcome::Outcome;
use crate::types::params::{CoordinatorConfig, ReconcilerParams};
use crate::types::pending_state::PendingStateRecord;
use crate::types::phase::{FailureReason, ReportedPhase};
use crate::types::report::{TraceUpdateReport, TraceUpdateRequest};
use crate::utils::metrics::{TraceMetrics, TraceOperation, RECONCILER_METRICS};

/// The collaborators a [`TraceReconciler`] works against.
#[derive(Clone)]
pub struct ReconcilerClients {
    pub pending_states: Arc<dyn PendingStateRepository>,
    pub locks: Arc<dyn LockClient>,
    pub storage: Arc<dyn TraceStorage>,
    pub lifecycle: Arc<dyn JobLifecycle>,
    pub metrics: Arc<dyn TraceMetrics>,
}

/// Applies runner build-state updates exactly once, and only when the job's trace is safe to finalize.
///
/// Holds no per-job state of its own: everything shared between workers lives in the ledger and the
/// lock store, so any number of reconcilers may serve the same job.
pub struct TraceReconciler {
    storage: Arc<dyn TraceStorage>,
    lifecycle: Arc<dyn JobLifecycle>,
    metrics: Arc<dyn TraceMetrics>,
    ledger: PendingStateLedger,
    lease: ExclusiveJobLease,
    gate: ChunkMigrationGate,
    validator: ChecksumValidator,
    backoff: Backoff,
    accept_timeout: Duration,
    lease_ttl: Duration,
}

impl TraceReconciler {
    pub fn new(clients: ReconcilerClients, params: &ReconcilerParams) -> Self {
        Self {
            ledger: PendingStateLedger::new(clients.pending_states, clients.metrics.clone()),
            lease: ExclusiveJobLease::new(clients.locks),
            gate: ChunkMigrationGate::new(clients.storage.clone()),
            validator: ChecksumValidator::new(clients.storage.clone()),
            storage: clients.storage,
            lifecycle: clients.lifecycle,
            metrics: clients.metrics,
            backoff: Backoff::new(params.max_backoff_seconds),
            accept_timeout: params.accept_timeout,
            lease_ttl: params.lease_ttl,
        }
    }

    /// Handle one build-state update from a runner.
    ///
    /// Returns `Committed`, `Deferred` with a retry hint, or `Rejected`. Only collaborator failures
    /// come back as errors; the whole call is safe to retry.
    #[instrument(skip_all, fields(job_id = job.id, phase = %request.state))]
    pub async fn handle_update(
        &self,
        job: &Job,
        request: TraceUpdateRequest,
        config: CoordinatorConfig,
    ) -> ReconcilerResult<Outcome> {
        let start = Instant::now();
        let result = self.reconcile(job, request, config).await;

        let status = match &result {
            Ok(outcome) => {
                info!(outcome = outcome.label(), retry_after = ?outcome.retry_after(), "Build state update handled");
                outcome.status_code().to_string()
            }
            Err(err) => {
                warn!(error = %err, "Build state update failed");
                "5xx".to_string()
            }
        };
        RECONCILER_METRICS.reconcile_outcomes.add(1, &[KeyValue::new("status", status)]);
        RECONCILER_METRICS.reconcile_response_time.record(start.elapsed().as_secs_f64(), &[]);

        result
    }

    async fn reconcile(
        &self,
        job: &Job,
        request: TraceUpdateRequest,
        config: CoordinatorConfig,
    ) -> ReconcilerResult<Outcome> {
        // Checksum validation below reads the final content, so the overwrite goes first.
        if let Some(trace) = request.trace.clone().filter(|trace| !trace.is_empty()) {
            self.overwrite_trace(job, trace, config).await?;
        }

        let report = match TraceUpdateReport::parse(job.id, &request) {
            Ok(report) => report,
            Err(err) => {
                warn!(state = %request.state, error = %err, "Rejecting build state update");
                return Ok(Outcome::Rejected);
            }
        };

        let Some(checksum) = report.deferrable_checksum(&config) else {
            return self.update_build_state(job, &report, &CommitHooks::new()).await;
        };

        let pending = self.ledger.create_or_fetch(&report, checksum, Utc::now()).await?;

        match self.lease.try_acquire(job.id, self.lease_ttl).await? {
            LeaseAttempt::Busy { holder } => {
                self.metrics.increment_trace_operation(TraceOperation::Locked);
                debug!(holder = %holder, "Trace lease busy, deferring");
                let live = self.live_chunks(job).await?;
                self.accept_build_state(&live, &pending).await
            }
            LeaseAttempt::Acquired(lease) => {
                let hooks = CommitHooks::new();
                lease.release_on_commit(&hooks);

                let result = self.process_build_state(job, &report, checksum, &pending, &hooks).await;

                if let Err(err) = lease.release().await {
                    // The lease TTL bounds how long this can block other updates.
                    warn!(error = %err, "Failed to release trace lease");
                }
                result
            }
        }
    }

    async fn overwrite_trace(&self, job: &Job, trace: Bytes, config: CoordinatorConfig) -> ReconcilerResult<()> {
        self.metrics.increment_trace_operation(TraceOperation::Overwrite);

        if config.overwrite_enabled {
            debug!(bytes = trace.len(), "Overwriting trace");
            self.storage.overwrite(job.id, trace).await?;
        }
        Ok(())
    }

    async fn process_build_state(
        &self,
        job: &Job,
        report: &TraceUpdateReport,
        checksum: &str,
        pending: &PendingStateRecord,
        hooks: &CommitHooks,
    ) -> ReconcilerResult<Outcome> {
        match self.gate.status(job.id).await? {
            MigrationStatus::Pending(live) => {
                if self.pending_state_outdated(pending) {
                    self.metrics.increment_trace_operation(TraceOperation::Discarded);
                    warn!(live_chunks = live.len(), "Trace migration wait exhausted, committing anyway");
                    self.update_build_state(job, report, hooks).await
                } else {
                    self.accept_build_state(&live, pending).await
                }
            }
            status @ MigrationStatus::Persisted { .. } => {
                self.validate_build_trace(job, checksum, &status).await?;
                self.update_build_state(job, report, hooks).await
            }
        }
    }

    async fn accept_build_state(&self, live: &[TraceChunk], pending: &PendingStateRecord) -> ReconcilerResult<Outcome> {
        self.gate.schedule(live).await?;
        self.metrics.increment_trace_operation(TraceOperation::Accepted);

        let retry_after = self.backoff.compute(pending.created_at, Utc::now());
        Ok(Outcome::Deferred { retry_after })
    }

    /// Integrity problems are recorded, never used to block completion.
    async fn validate_build_trace(&self, job: &Job, checksum: &str, status: &MigrationStatus) -> ReconcilerResult<()> {
        if status.is_finalized() {
            self.metrics.increment_trace_operation(TraceOperation::Finalized);
        }

        if !self.validator.validate(job.id, checksum).await?.is_valid() {
            self.metrics.increment_trace_operation(TraceOperation::Invalid);
        }
        Ok(())
    }

    async fn update_build_state(
        &self,
        job: &Job,
        report: &TraceUpdateReport,
        hooks: &CommitHooks,
    ) -> ReconcilerResult<Outcome> {
        match report.phase {
            ReportedPhase::Running => {
                if self.lifecycle.needs_touch(job) {
                    self.lifecycle.touch(job).await?;
                }
            }
            ReportedPhase::Success => {
                self.lifecycle.commit_success(job, hooks).await?;
            }
            ReportedPhase::Failed => {
                let reason = report.failure_reason.unwrap_or(FailureReason::UnknownFailure);
                self.lifecycle.commit_failure(job, reason, hooks).await?;
            }
        }
        Ok(Outcome::Committed)
    }

    async fn live_chunks(&self, job: &Job) -> ReconcilerResult<Vec<TraceChunk>> {
        Ok(match self.gate.status(job.id).await? {
            MigrationStatus::Pending(live) => live,
            MigrationStatus::Persisted { .. } => Vec::new(),
        })
    }

    fn pending_state_outdated(&self, pending: &PendingStateRecord) -> bool {
        let timeout = chrono::Duration::from_std(self.accept_timeout).unwrap_or_else(|_| chrono::Duration::max_value());
        pending.is_outdated(Utc::now(), timeout)
    }
}
