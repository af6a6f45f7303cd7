use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::core::client::lifecycle::LifecycleError;
use crate::core::client::lock::LockError;
use crate::core::client::storage::StorageError;

/// Result type for reconciler operations
pub type ReconcilerResult<T> = Result<T, ReconcilerError>;

/// Failures that cross the reconciler boundary.
///
/// Lease contention, ledger races and checksum mismatches are folded into an `Outcome` and never show up here.
#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Lock error: {0}")]
    LockError(#[from] LockError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Lifecycle error: {0}")]
    LifecycleError(#[from] LifecycleError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("OTEL Metrics Error: {0}")]
    OtlMetricsError(String),
}
