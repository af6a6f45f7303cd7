use std::sync::Arc;

use tracing::warn;

use crate::core::client::storage::{StorageError, TraceStorage};
use crate::types::job::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumVerdict {
    Valid,
    Mismatch { reported: String, computed: String },
}

impl ChecksumVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChecksumVerdict::Valid)
    }
}

/// Compares a runner's checksum with one computed from the persisted trace.
pub struct ChecksumValidator {
    storage: Arc<dyn TraceStorage>,
}

impl ChecksumValidator {
    pub fn new(storage: Arc<dyn TraceStorage>) -> Self {
        Self { storage }
    }

    /// Only meaningful once no chunk of the trace is live.
    pub async fn validate(&self, job_id: JobId, reported: &str) -> Result<ChecksumVerdict, StorageError> {
        let computed = self.storage.compute_checksum(job_id).await?;

        if computed == reported {
            return Ok(ChecksumVerdict::Valid);
        }

        warn!(job_id, reported, computed = %computed, "Trace checksum mismatch");
        Ok(ChecksumVerdict::Mismatch { reported: reported.to_string(), computed })
    }
}
