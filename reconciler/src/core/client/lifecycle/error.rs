use thiserror::Error;

use crate::types::job::{JobId, JobStatus};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Job {job_id} cannot transition from {from} to {to}")]
    InvalidTransition { job_id: JobId, from: JobStatus, to: JobStatus },

    #[error("Job {0} not found")]
    JobNotFound(JobId),

    #[error("Job lifecycle backend error: {0}")]
    Backend(String),
}
