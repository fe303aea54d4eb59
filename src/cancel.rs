//! Cooperative cancellation for job executions
//!
//! A [`RunToken`] wraps a shared [`CancellationToken`] with a per-run
//! deadline. Every layer that does work in a loop checks the token at its
//! suspension points (before each diff action, before each walk) instead of
//! polling ad-hoc flags.

use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a run was stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupt {
    /// The shared cancellation signal fired (dispatcher shutdown or user stop)
    #[error("cancelled")]
    Cancelled,

    /// The run exceeded its own time budget
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation handle for one job execution.
///
/// Derived from the dispatcher's root token so a single `stop()` reaches
/// every in-flight run, with an additional finite deadline layered on top so
/// one stuck job cannot hold shutdown forever.
#[derive(Debug, Clone)]
pub struct RunToken {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RunToken {
    /// Token tied to `parent` with a run budget of `budget`.
    pub fn with_deadline(parent: &CancellationToken, budget: Duration) -> Self {
        Self {
            token: parent.child_token(),
            deadline: Some(Instant::now() + budget),
        }
    }

    /// Standalone token with no deadline. Cancel it via [`RunToken::cancel`].
    pub fn detached() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Signal cancellation to everything holding a clone of this token.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check for cancellation or an expired deadline.
    ///
    /// Cancellation wins when both apply, so shutdown is always reported as
    /// `Cancelled` rather than a coincidental timeout.
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.token.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Interrupt::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::detached()
    }
}
