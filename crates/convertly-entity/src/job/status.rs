//! Job status enumeration and its state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a conversion job.
///
/// Transitions are strictly forward: `queued → processing →
/// {completed | failed}`. There is no cancelled state and no path out
/// of a terminal state; a failed job stays failed and must be
/// resubmitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Record created, waiting for the background task to pick it up.
    Queued,
    /// Handed to a worker pool, transformation in progress.
    Processing,
    /// Transformation succeeded; the record carries a result.
    Completed,
    /// Transformation failed; the record carries an error message.
    Failed,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check whether moving to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
