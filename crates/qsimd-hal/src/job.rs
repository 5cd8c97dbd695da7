//! Job lifecycle types.
//!
//! The job state machine:
//!
//! ```text
//!   Pending ──→ Running ──→ Succeeded
//!      │           │
//!      │           ├──→ Failed(reason)
//!      │           │
//!      └───────────┴──→ Cancelled
//! ```
//!
//! A pending job may also fail outright (timeout while queued). Transitions
//! are monotonic and terminal states are permanent. Jobs live only as long
//! as the request that created them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// A fresh random (v4) id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Admitted, waiting for a worker.
    Pending,
    /// A worker is running the backend.
    Running,
    /// The backend returned counts.
    Succeeded,
    /// Job failed with an error message.
    Failed(String),
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `next` respects the state machine.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Running) => true,
            (JobStatus::Pending | JobStatus::Running, JobStatus::Failed(_) | JobStatus::Cancelled) => {
                true
            }
            (JobStatus::Running, JobStatus::Succeeded) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed(msg) => write!(f, "failed: {msg}"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A request-scoped simulation job with lifecycle timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationJob {
    pub id: JobId,
    pub status: JobStatus,
    pub shots: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl SimulationJob {
    /// Create a pending job.
    pub fn new(shots: u32) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            shots,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Move to `next` if the state machine allows it.
    ///
    /// Returns `false` and leaves the job untouched otherwise.
    #[must_use]
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(&next) {
            return false;
        }
        if matches!(next, JobStatus::Running) {
            self.started_at = Some(Utc::now());
        }
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.status = next;
        true
    }

    /// Milliseconds between start and finish, if both happened.
    pub fn run_time_ms(&self) -> Option<u64> {
        let elapsed = self.finished_at? - self.started_at?;
        u64::try_from(elapsed.num_milliseconds()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique_uuids() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a.0).is_ok());
    }

    #[test]
    fn test_happy_path() {
        let mut job = SimulationJob::new(100);
        assert_eq!(job.status, JobStatus::Pending);

        assert!(job.transition(JobStatus::Running));
        assert!(job.started_at.is_some());
        assert!(job.transition(JobStatus::Succeeded));
        assert!(job.finished_at.is_some());
        assert!(job.status.is_terminal());
        assert!(job.run_time_ms().is_some());
    }

    #[test]
    fn test_terminal_states_are_permanent() {
        for terminal in [
            JobStatus::Succeeded,
            JobStatus::Failed("x".into()),
            JobStatus::Cancelled,
        ] {
            for next in [
                JobStatus::Pending,
                JobStatus::Running,
                JobStatus::Succeeded,
                JobStatus::Failed("y".into()),
                JobStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(&next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_no_backwards_or_skipping_moves() {
        assert!(!JobStatus::Running.can_transition_to(&JobStatus::Pending));
        assert!(!JobStatus::Pending.can_transition_to(&JobStatus::Succeeded));
        assert!(JobStatus::Pending.can_transition_to(&JobStatus::Failed("timeout".into())));
        assert!(JobStatus::Pending.can_transition_to(&JobStatus::Cancelled));
    }

    #[test]
    fn test_rejected_transition_leaves_job_unchanged() {
        let mut job = SimulationJob::new(1);
        assert!(!job.transition(JobStatus::Succeeded));
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.finished_at.is_none());
    }
}
