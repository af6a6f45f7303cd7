/// Collection holding one document per distinct `(job_id, state, trace_checksum)` report.
pub const PENDING_STATES_COLLECTION: &str = "build_pending_states";

/// Collection holding the per-job trace leases.
pub const TRACE_LEASES_COLLECTION: &str = "trace_leases";

pub const PENDING_STATE_UNIQUE_INDEX: &str = "job_state_checksum_unique";
pub const PENDING_STATE_TTL_INDEX: &str = "created_at_ttl";
pub const TRACE_LEASE_TTL_INDEX: &str = "expires_at_ttl";

/// Server error code MongoDB uses for unique index violations.
pub const DUPLICATE_KEY_ERROR_CODE: i32 = 11000;

/// Reported to the server in the connection handshake.
pub const APP_NAME: &str = "trace-reconciler";
