use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = u64;
pub type ProjectId = u64;

/// Lifecycle status of a job as seen by the reconciler.
///
/// The reconciler only reads this; transitions belong to the job lifecycle collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Created,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed | JobStatus::Canceled)
    }
}

/// A job whose trace is streamed back by a runner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    /// Owning project, used to scope the deferral feature.
    pub project_id: ProjectId,
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: JobId, project_id: ProjectId, status: JobStatus) -> Self {
        Self { id, project_id, status, updated_at: Utc::now() }
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }
}
