use serde::Serialize;

/// Answer returned to a runner for one build-state update.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The reported state has been applied to the job.
    Committed,
    /// Trace migration is still in flight; retry after `retry_after` seconds.
    Deferred { retry_after: u64 },
    /// The update could not be understood.
    Rejected,
}

impl Outcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::Committed => 200,
            Outcome::Deferred { .. } => 202,
            Outcome::Rejected => 400,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Outcome::Deferred { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Committed => "committed",
            Outcome::Deferred { .. } => "deferred",
            Outcome::Rejected => "rejected",
        }
    }
}
