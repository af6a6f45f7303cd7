use clap::Args;

/// Parameters controlling how build-state updates are reconciled with trace storage.
#[derive(Debug, Clone, Args)]
pub struct ReconcileCliArgs {
    /// Let terminal updates that carry a checksum wait for live trace chunks to be migrated.
    #[arg(env = "TRACE_RECONCILER_ACCEPT_TRACE", long, default_value_t = false)]
    pub accept_trace: bool,

    /// Limit trace acceptance to these project ids. Repeat the flag for several projects.
    #[arg(env = "TRACE_RECONCILER_ACCEPT_TRACE_PROJECTS", long, value_delimiter = ',')]
    pub accept_trace_project: Vec<u64>,

    /// Allow runners to overwrite the stored trace with the full trace they send.
    #[arg(env = "TRACE_RECONCILER_TRACE_OVERWRITE", long, default_value_t = false)]
    pub trace_overwrite: bool,

    /// Seconds a pending state may wait for migration before the state is committed anyway.
    #[arg(env = "TRACE_RECONCILER_ACCEPT_TIMEOUT_SECONDS", long, default_value = "300")]
    pub accept_timeout_seconds: u64,

    /// Maximum seconds a single holder may keep a job's trace lease.
    #[arg(env = "TRACE_RECONCILER_TRACE_LEASE_TTL_SECONDS", long, default_value = "28800")]
    pub trace_lease_ttl_seconds: u64,

    /// Seconds pending-state records are kept before MongoDB expires them.
    #[arg(env = "TRACE_RECONCILER_PENDING_STATE_RETENTION_SECONDS", long, default_value = "86400")]
    pub pending_state_retention_seconds: u64,

    /// Upper bound of the retry hint handed to runners.
    #[arg(env = "TRACE_RECONCILER_MAX_BACKOFF_SECONDS", long, default_value = "16")]
    pub max_backoff_seconds: u64,
}
