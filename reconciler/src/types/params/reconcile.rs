use std::collections::HashSet;
use std::time::Duration;

use crate::cli::reconcile::ReconcileCliArgs;
use crate::types::job::{Job, ProjectId};
use crate::ReconcilerError;

/// Feature switches resolved once per update call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Terminal updates carrying a checksum may wait for trace migration.
    pub deferral_enabled: bool,
    /// Runners may replace the stored trace wholesale.
    pub overwrite_enabled: bool,
}

/// Validated reconciler settings.
///
/// `accept_timeout` and `lease_ttl` are unrelated knobs: the first bounds how long a runner is asked to
/// wait for migration, the second bounds how long a crashed holder can keep a job's lease.
#[derive(Debug, Clone)]
pub struct ReconcilerParams {
    pub accept_trace: bool,
    /// Projects the deferral feature is limited to. Empty means every project.
    pub accept_trace_projects: HashSet<ProjectId>,
    pub trace_overwrite: bool,
    pub accept_timeout: Duration,
    pub lease_ttl: Duration,
    pub pending_state_retention: Duration,
    pub max_backoff_seconds: u64,
}

impl Default for ReconcilerParams {
    fn default() -> Self {
        Self {
            accept_trace: false,
            accept_trace_projects: HashSet::new(),
            trace_overwrite: false,
            accept_timeout: Duration::from_secs(5 * 60),
            lease_ttl: Duration::from_secs(8 * 60 * 60),
            pending_state_retention: Duration::from_secs(24 * 60 * 60),
            max_backoff_seconds: crate::reconcile::backoff::DEFAULT_MAX_BACKOFF_SECONDS,
        }
    }
}

impl ReconcilerParams {
    pub fn coordinator_config(&self, job: &Job) -> CoordinatorConfig {
        let project_allowed =
            self.accept_trace_projects.is_empty() || self.accept_trace_projects.contains(&job.project_id);

        CoordinatorConfig {
            deferral_enabled: self.accept_trace && project_allowed,
            overwrite_enabled: self.trace_overwrite,
        }
    }
}

impl TryFrom<ReconcileCliArgs> for ReconcilerParams {
    type Error = ReconcilerError;
    fn try_from(args: ReconcileCliArgs) -> Result<Self, Self::Error> {
        if args.accept_timeout_seconds == 0 {
            return Err(ReconcilerError::ConfigError("accept timeout must be greater than 0".to_string()));
        }
        if args.trace_lease_ttl_seconds == 0 {
            return Err(ReconcilerError::ConfigError("trace lease ttl must be greater than 0".to_string()));
        }
        if args.max_backoff_seconds == 0 {
            return Err(ReconcilerError::ConfigError("max backoff must be at least 1 second".to_string()));
        }
        // The TTL index must not sweep a pending state before its accept timeout has run out.
        if args.pending_state_retention_seconds <= args.accept_timeout_seconds {
            return Err(ReconcilerError::ConfigError(format!(
                "pending state retention ({}s) must be longer than the accept timeout ({}s)",
                args.pending_state_retention_seconds, args.accept_timeout_seconds
            )));
        }

        Ok(Self {
            accept_trace: args.accept_trace,
            accept_trace_projects: args.accept_trace_project.into_iter().collect(),
            trace_overwrite: args.trace_overwrite,
            accept_timeout: Duration::from_secs(args.accept_timeout_seconds),
            lease_ttl: Duration::from_secs(args.trace_lease_ttl_seconds),
            pending_state_retention: Duration::from_secs(args.pending_state_retention_seconds),
            max_backoff_seconds: args.max_backoff_seconds,
        })
    }
}
