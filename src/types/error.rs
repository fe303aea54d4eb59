//! Error types for treemirror

use crate::cancel::Interrupt;
use crate::types::SyncOutcome;
use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by the walk, diff, sync and dispatch layers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A walked path was not valid UTF-8 and cannot be slash-normalized
    #[error("non-UTF-8 path: {0:?}")]
    InvalidPath(PathBuf),

    /// Source tree enumeration failed; the run is aborted before any sync
    #[error("walk source {root:?}: {source}")]
    SourceWalk {
        root: PathBuf,
        #[source]
        source: Box<SyncError>,
    },

    /// Destination tree enumeration failed; the run is aborted before any sync
    #[error("walk destination {root:?}: {source}")]
    DestinationWalk {
        root: PathBuf,
        #[source]
        source: Box<SyncError>,
    },

    /// The run was cancelled or ran out of budget mid-sync.
    ///
    /// Already-applied actions stand; `partial` reflects exactly what was done.
    #[error("sync {reason} after {} applied actions", partial.total_applied())]
    Interrupted {
        reason: Interrupt,
        partial: Box<SyncOutcome>,
    },

    /// Aggregate of per-item failures after a completed sync pass
    #[error("{count} errors during sync")]
    Partial { count: usize },

    /// `run_now` was asked for a name the registry does not know
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// A launch was skipped because an execution of the same job is in flight
    #[error("job already running: {0}")]
    JobAlreadyRunning(String),
}

impl SyncError {
    /// True for cancellation/timeout: the run was stopped, not broken.
    pub fn is_interruption(&self) -> bool {
        matches!(self, SyncError::Interrupted { .. })
    }

    /// True when the run never reached the sync step.
    pub fn is_enumeration_failure(&self) -> bool {
        matches!(
            self,
            SyncError::SourceWalk { .. } | SyncError::DestinationWalk { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_automatic_conversion() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let err: SyncError = io_error.into();

        assert!(matches!(err, SyncError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_partial_error_message() {
        let err = SyncError::Partial { count: 3 };
        assert_eq!(err.to_string(), "3 errors during sync");
    }

    #[test]
    fn test_interrupted_carries_partial_outcome() {
        let mut partial = SyncOutcome::default();
        partial.created = 1;
        let err = SyncError::Interrupted {
            reason: Interrupt::Cancelled,
            partial: Box::new(partial),
        };

        assert!(err.is_interruption());
        assert!(err.to_string().contains("cancelled"));
        assert!(err.to_string().contains("1 applied action"));
    }

    #[test]
    fn test_enumeration_failure_classification() {
        let err = SyncError::SourceWalk {
            root: PathBuf::from("/missing"),
            source: Box::new(SyncError::Io(IoError::new(ErrorKind::NotFound, "gone"))),
        };
        assert!(err.is_enumeration_failure());
        assert!(!err.is_interruption());
    }
}
