pub mod error;
pub mod hooks;

use async_trait::async_trait;
pub use error::LifecycleError;
pub use hooks::CommitHooks;

use crate::types::job::Job;
use crate::types::phase::FailureReason;

/// The job state machine the reconciler drives.
///
/// Terminal transitions receive the `CommitHooks` of the current update. An implementation must run
/// them (`hooks.run().await`) right after the status write is durable and before it schedules any
/// follow-up work, so the trace lease is not held across that work. Committing an already terminal
/// job must be a no-op.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobLifecycle: Send + Sync {
    /// Whether a running job is due for a liveness touch.
    fn needs_touch(&self, job: &Job) -> bool;

    async fn touch(&self, job: &Job) -> Result<(), LifecycleError>;

    async fn commit_success(&self, job: &Job, hooks: &CommitHooks) -> Result<(), LifecycleError>;

    async fn commit_failure(
        &self,
        job: &Job,
        reason: FailureReason,
        hooks: &CommitHooks,
    ) -> Result<(), LifecycleError>;
}
