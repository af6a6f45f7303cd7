use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::client::lifecycle::CommitHooks;
use crate::core::client::lock::{LockClient, LockError, LockResult};
use crate::types::job::JobId;

/// Outcome of a non-blocking lease attempt.
#[derive(Debug)]
pub enum LeaseAttempt {
    Acquired(JobLease),
    /// Someone else is reconciling this job right now.
    Busy { holder: String },
}

/// Per-job mutual exclusion around the decide-and-commit step of a trace update.
pub struct ExclusiveJobLease {
    client: Arc<dyn LockClient>,
}

impl ExclusiveJobLease {
    pub fn new(client: Arc<dyn LockClient>) -> Self {
        Self { client }
    }

    pub fn lease_key(job_id: JobId) -> String {
        format!("trace:write:lock:{}", job_id)
    }

    /// Try once to take the lease for `job_id`, held for at most `ttl`. Never waits on contention.
    pub async fn try_acquire(&self, job_id: JobId, ttl: Duration) -> Result<LeaseAttempt, LockError> {
        let key = Self::lease_key(job_id);
        let token = Uuid::new_v4().to_string();

        match self.client.acquire_lock_if_available(&key, ttl.as_secs().max(1), &token).await? {
            LockResult::Acquired => {
                debug!(job_id, token = %token, "Trace lease acquired");
                Ok(LeaseAttempt::Acquired(JobLease {
                    client: self.client.clone(),
                    key,
                    token,
                    job_id,
                    acquired_at: Utc::now(),
                    released: Arc::new(AtomicBool::new(false)),
                    on_release: Arc::new(CommitHooks::new()),
                    armed: true,
                }))
            }
            LockResult::AlreadyHeld(holder) => Ok(LeaseAttempt::Busy { holder }),
            other => {
                warn!(job_id, result = ?other, "Unexpected lock result while acquiring trace lease");
                Ok(LeaseAttempt::Busy { holder: String::new() })
            }
        }
    }
}

/// A held trace lease. Released exactly once, either by a commit hook or by [`JobLease::release`].
///
/// Dropping a lease that is still held (a panicking collaborator, a cancelled request) releases it on the
/// current tokio runtime in the background.
pub struct JobLease {
    client: Arc<dyn LockClient>,
    key: String,
    token: String,
    job_id: JobId,
    acquired_at: DateTime<Utc>,
    released: Arc<AtomicBool>,
    on_release: Arc<CommitHooks>,
    /// Cleared once an explicit release has reported its result.
    armed: bool,
}

impl std::fmt::Debug for JobLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobLease")
            .field("key", &self.key)
            .field("token", &self.token)
            .field("acquired_at", &self.acquired_at)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish()
    }
}

impl JobLease {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Run `callback` once the lease has been released, by whichever path releases it.
    pub fn on_release<F, Fut>(&self, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_release.register(callback);
    }

    /// Release this lease as soon as the job lifecycle reports its status write as committed.
    pub fn release_on_commit(&self, hooks: &CommitHooks) {
        let handle = self.handle();
        let job_id = self.job_id;

        hooks.register(move || async move {
            if let Err(err) = handle.release_once().await {
                warn!(job_id, error = %err, "Failed to release trace lease on commit");
            }
        });
    }

    /// Release the lease unless a commit hook already did.
    pub async fn release(mut self) -> Result<(), LockError> {
        let result = self.handle().release_once().await;
        self.armed = false;
        result
    }

    fn handle(&self) -> ReleaseHandle {
        ReleaseHandle {
            client: self.client.clone(),
            key: self.key.clone(),
            token: self.token.clone(),
            released: self.released.clone(),
            on_release: self.on_release.clone(),
        }
    }
}

impl Drop for JobLease {
    fn drop(&mut self) {
        if !self.armed || self.is_released() {
            return;
        }

        let job_id = self.job_id;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(job_id, "Trace lease dropped while held, releasing in the background");
                let handle = self.handle();
                runtime.spawn(async move {
                    if let Err(err) = handle.release_once().await {
                        warn!(job_id, error = %err, "Background release of trace lease failed");
                    }
                });
            }
            Err(_) => {
                warn!(job_id, key = %self.key, "Trace lease dropped outside a runtime, it lapses at its ttl");
            }
        }
    }
}

struct ReleaseHandle {
    client: Arc<dyn LockClient>,
    key: String,
    token: String,
    released: Arc<AtomicBool>,
    on_release: Arc<CommitHooks>,
}

impl ReleaseHandle {
    async fn release_once(&self) -> Result<(), LockError> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        match self.client.release_lock(&self.key, &self.token).await {
            Ok(LockResult::Released) => {
                debug!(key = %self.key, "Trace lease released");
            }
            Ok(other) => {
                // Expired and possibly taken over by someone else; nothing left to release.
                warn!(key = %self.key, result = ?other, "Trace lease was no longer held at release");
            }
            Err(err) => {
                self.released.store(false, Ordering::SeqCst);
                return Err(err);
            }
        }

        self.on_release.run().await;
        Ok(())
    }
}
