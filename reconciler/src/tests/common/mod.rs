use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rstest::*;

use crate::core::client::database::{InMemoryPendingStateRepository, PendingStateRepository};
use crate::core::client::lifecycle::{CommitHooks, JobLifecycle, LifecycleError};
use crate::core::client::lock::{InMemoryLockClient, LockClient};
use crate::core::client::storage::{trace_checksum, InMemoryTraceStorage};
use crate::reconcile::lease::ExclusiveJobLease;
use crate::reconcile::{ReconcilerClients, TraceReconciler};
use crate::types::job::{Job, JobId, JobStatus};
use crate::types::params::{CoordinatorConfig, ReconcilerParams};
use crate::types::pending_state::PendingStateRecord;
use crate::types::phase::{FailureReason, ReportedPhase};
use crate::utils::metrics::{TraceMetrics, TraceOperation};

pub const JOB_ID: JobId = 1;
pub const PROJECT_ID: u64 = 42;

#[fixture]
pub fn running_job() -> Job {
    Job::new(JOB_ID, PROJECT_ID, JobStatus::Running)
}

#[fixture]
pub fn deferral_config() -> CoordinatorConfig {
    CoordinatorConfig { deferral_enabled: true, overwrite_enabled: false }
}

/// Keeps every trace operation so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingTraceMetrics {
    operations: Mutex<Vec<TraceOperation>>,
}

impl RecordingTraceMetrics {
    pub fn count(&self, operation: TraceOperation) -> usize {
        self.operations.lock().unwrap().iter().filter(|op| **op == operation).count()
    }

    pub fn operations(&self) -> Vec<TraceOperation> {
        self.operations.lock().unwrap().clone()
    }
}

impl TraceMetrics for RecordingTraceMetrics {
    fn increment_trace_operation(&self, operation: TraceOperation) {
        self.operations.lock().unwrap().push(operation);
    }
}

/// A status transition actually applied by [`FakeLifecycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Success,
    Failed(FailureReason),
}

/// Job lifecycle that keeps statuses in memory, runs commit hooks after the write and records whether the
/// trace lease was still held once they ran.
pub struct FakeLifecycle {
    locks: Arc<dyn LockClient>,
    statuses: Mutex<HashMap<JobId, JobStatus>>,
    transitions: Mutex<Vec<(JobId, Transition)>>,
    touches: Mutex<usize>,
    lease_held_after_hooks: Mutex<Vec<bool>>,
}

impl FakeLifecycle {
    pub fn new(locks: Arc<dyn LockClient>) -> Self {
        Self {
            locks,
            statuses: Mutex::new(HashMap::new()),
            transitions: Mutex::new(Vec::new()),
            touches: Mutex::new(0),
            lease_held_after_hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn transitions(&self) -> Vec<(JobId, Transition)> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn touches(&self) -> usize {
        *self.touches.lock().unwrap()
    }

    pub fn lease_held_after_hooks(&self) -> Vec<bool> {
        self.lease_held_after_hooks.lock().unwrap().clone()
    }

    async fn commit(&self, job: &Job, status: JobStatus, transition: Transition, hooks: &CommitHooks) {
        let applied = {
            let mut statuses = self.statuses.lock().unwrap();
            let current = statuses.entry(job.id).or_insert(job.status);
            if current.is_complete() {
                false
            } else {
                *current = status;
                true
            }
        };
        if applied {
            self.transitions.lock().unwrap().push((job.id, transition));
        }

        hooks.run().await;

        let held = self.locks.is_locked(&ExclusiveJobLease::lease_key(job.id)).await.unwrap();
        self.lease_held_after_hooks.lock().unwrap().push(held);
    }
}

#[async_trait]
impl JobLifecycle for FakeLifecycle {
    fn needs_touch(&self, job: &Job) -> bool {
        job.is_running()
    }

    async fn touch(&self, _job: &Job) -> Result<(), LifecycleError> {
        *self.touches.lock().unwrap() += 1;
        Ok(())
    }

    async fn commit_success(&self, job: &Job, hooks: &CommitHooks) -> Result<(), LifecycleError> {
        self.commit(job, JobStatus::Success, Transition::Success, hooks).await;
        Ok(())
    }

    async fn commit_failure(
        &self,
        job: &Job,
        reason: FailureReason,
        hooks: &CommitHooks,
    ) -> Result<(), LifecycleError> {
        self.commit(job, JobStatus::Failed, Transition::Failed(reason), hooks).await;
        Ok(())
    }
}

/// A reconciler wired to in-memory collaborators, with handles on each of them.
pub struct TestHarness {
    pub storage: Arc<InMemoryTraceStorage>,
    pub pending_states: Arc<InMemoryPendingStateRepository>,
    pub locks: Arc<InMemoryLockClient>,
    pub lifecycle: Arc<FakeLifecycle>,
    pub metrics: Arc<RecordingTraceMetrics>,
    pub reconciler: Arc<TraceReconciler>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_params(&ReconcilerParams::default())
    }

    pub fn with_params(params: &ReconcilerParams) -> Self {
        let locks = Arc::new(InMemoryLockClient::new());
        let lifecycle = Arc::new(FakeLifecycle::new(locks.clone()));
        Self::build(params, locks, lifecycle.clone(), lifecycle)
    }

    /// Same wiring, with `lifecycle` driving the reconciler instead of the fake.
    pub fn with_lifecycle(lifecycle: Arc<dyn JobLifecycle>) -> Self {
        let locks = Arc::new(InMemoryLockClient::new());
        let fake = Arc::new(FakeLifecycle::new(locks.clone()));
        Self::build(&ReconcilerParams::default(), locks, fake, lifecycle)
    }

    fn build(
        params: &ReconcilerParams,
        locks: Arc<InMemoryLockClient>,
        fake: Arc<FakeLifecycle>,
        lifecycle: Arc<dyn JobLifecycle>,
    ) -> Self {
        let storage = Arc::new(InMemoryTraceStorage::new());
        let pending_states = Arc::new(InMemoryPendingStateRepository::new());
        let metrics = Arc::new(RecordingTraceMetrics::default());

        let clients = ReconcilerClients {
            pending_states: pending_states.clone(),
            locks: locks.clone(),
            storage: storage.clone(),
            lifecycle,
            metrics: metrics.clone(),
        };
        let reconciler = Arc::new(TraceReconciler::new(clients, params));

        Self { storage, pending_states, locks, lifecycle: fake, metrics, reconciler }
    }

    /// Write `parts` as chunks of `job_id`, persisting the first `persisted` of them. Returns the trace checksum.
    pub async fn seed_trace(&self, job_id: JobId, parts: &[&[u8]], persisted: usize) -> String {
        for (position, part) in parts.iter().enumerate() {
            let index = self.storage.append(job_id, part.to_vec()).await;
            if position < persisted {
                self.storage.persist(job_id, index).await.unwrap();
            }
        }
        trace_checksum(parts.iter().copied())
    }

    /// Pretend the first sighting of this report happened `age` ago.
    pub async fn seed_pending_state(&self, job_id: JobId, phase: ReportedPhase, checksum: &str, age: Duration) {
        let created_at: DateTime<Utc> = Utc::now() - age;
        self.pending_states
            .insert_if_absent(PendingStateRecord::new(job_id, phase, checksum, None, created_at))
            .await
            .unwrap();
    }

    pub async fn lease_held(&self, job_id: JobId) -> bool {
        self.locks.is_locked(&ExclusiveJobLease::lease_key(job_id)).await.unwrap()
    }
}
