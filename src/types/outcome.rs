//! Aggregate results of one sync pass and job status

use camino::Utf8PathBuf;
use serde::Serialize;
use std::fmt;

/// Statistics and per-item errors accumulated while applying one diff.
///
/// Mutated only by the syncer during a single pass, then frozen into the
/// owning job's last-run state and the emitted event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncOutcome {
    /// Files and directories newly created at the destination
    pub created: usize,

    /// Files replaced at the destination
    pub updated: usize,

    /// Destination entries removed
    pub deleted: usize,

    /// Bytes copied for created and updated files
    pub bytes_transferred: u64,

    /// Per-item failures, in the order they occurred
    pub errors: Vec<ItemError>,
}

impl SyncOutcome {
    /// Total number of actions that took effect.
    pub fn total_applied(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// True when every action in the pass succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One failed action: the relative path it targeted and why it failed.
///
/// The cause is captured as text so outcomes stay cloneable snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub path: Utf8PathBuf,
    pub cause: String,
}

impl ItemError {
    pub fn new(path: impl Into<Utf8PathBuf>, cause: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.cause)
    }
}

/// Lifecycle state of a job.
///
/// `Idle -> Running -> {Succeeded | Failed} -> Running -> ...`; a completed
/// job can always run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Idle => "idle",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_outcome_is_clean() {
        let outcome = SyncOutcome::default();
        assert!(outcome.is_clean());
        assert_eq!(outcome.total_applied(), 0);
    }

    #[test]
    fn test_total_applied_counts_all_action_kinds() {
        let outcome = SyncOutcome {
            created: 2,
            updated: 1,
            deleted: 3,
            bytes_transferred: 512,
            errors: vec![],
        };
        assert_eq!(outcome.total_applied(), 6);
    }

    #[test]
    fn test_item_error_display() {
        let err = ItemError::new("a/b.txt", "permission denied");
        assert_eq!(err.to_string(), "a/b.txt: permission denied");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(JobStatus::Idle.to_string(), "idle");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }
}
