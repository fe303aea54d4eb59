//! Sync jobs - one full walk/diff/sync cycle plus last-run state
//!
//! A [`Job`] owns everything one mirroring pair needs: the roots, the
//! differ, the syncer and the destination store. Its mutable state is only
//! ever written by the execution currently running it; the dispatcher
//! guarantees at most one of those via [`Job::try_begin`].

use crate::cancel::RunToken;
use crate::diff::Differ;
use crate::scanner::{collect_entries, LocalWalker};
use crate::store::RemoteStore;
use crate::syncer::Syncer;
use crate::types::{JobStatus, SyncError, SyncOutcome};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Snapshot of a completed (or skipped) execution, emitted once per run.
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub job: String,
    pub status: JobStatus,
    pub outcome: Option<SyncOutcome>,
    pub error: Option<Arc<SyncError>>,
}

impl JobEvent {
    /// Event surfacing a launch that was skipped because the job already
    /// has an execution in flight.
    ///
    /// `status` is the job's state as observed at skip time: the claimed
    /// execution may still be queued behind the concurrency limit, so this
    /// is not necessarily `Running`.
    pub fn skipped(job: impl Into<String>, status: JobStatus) -> Self {
        let job = job.into();
        Self {
            error: Some(Arc::new(SyncError::JobAlreadyRunning(job.clone()))),
            job,
            status,
            outcome: None,
        }
    }
}

/// Copy of a job's observable state. Handed to callers instead of references
/// into the registry.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub name: String,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub status: JobStatus,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<SyncOutcome>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct JobState {
    status: JobStatus,
    last_run_at: Option<DateTime<Utc>>,
    last_outcome: Option<SyncOutcome>,
    last_error: Option<Arc<SyncError>>,
}

/// One configured mirroring pair and its run state.
pub struct Job {
    name: String,
    source_root: PathBuf,
    dest_root: PathBuf,
    differ: Differ,
    syncer: Syncer,
    store: Arc<dyn RemoteStore>,
    running: AtomicBool,
    state: Mutex<JobState>,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        source_root: impl Into<PathBuf>,
        dest_root: impl Into<PathBuf>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            name: name.into(),
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            differ: Differ::new(),
            syncer: Syncer::new(store.clone()),
            store,
            running: AtomicBool::new(false),
            state: Mutex::new(JobState::default()),
        }
    }

    /// Enable or disable deletion of extra destination files for this job.
    pub fn with_delete_extra_files(mut self, delete_extra_files: bool) -> Self {
        self.differ = Differ::with_delete_extra_files(delete_extra_files);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Claim the job for one execution. Returns false when a previous
    /// execution is still in flight; callers must then skip the launch.
    pub fn try_begin(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the execution claim without running. Used when a claimed
    /// launch cannot proceed (shutdown won, or the task panicked).
    pub fn release(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Current state, copied.
    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.state();
        JobSnapshot {
            name: self.name.clone(),
            source_root: self.source_root.clone(),
            dest_root: self.dest_root.clone(),
            status: state.status,
            last_run_at: state.last_run_at,
            last_outcome: state.last_outcome.clone(),
            last_error: state.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    /// Execute one full cycle: walk source, walk destination, diff, sync.
    ///
    /// The caller must hold the claim from [`Job::try_begin`]; `run` drops
    /// it on the way out. Exactly one [`JobEvent`] is returned per run,
    /// whatever happened.
    pub fn run(&self, token: &RunToken) -> JobEvent {
        {
            let mut state = self.state();
            state.status = JobStatus::Running;
            state.last_run_at = Some(Utc::now());
        }
        info!(job = %self.name, "job run started");

        let result = self.execute(token);
        let event = self.finish(result);
        self.running.store(false, Ordering::Release);

        match (&event.error, &event.outcome) {
            (None, Some(outcome)) => info!(
                job = %self.name,
                created = outcome.created,
                updated = outcome.updated,
                deleted = outcome.deleted,
                bytes = outcome.bytes_transferred,
                "job run succeeded"
            ),
            (Some(error), _) => info!(job = %self.name, %error, "job run failed"),
            _ => {}
        }

        event
    }

    fn execute(&self, token: &RunToken) -> Result<SyncOutcome, SyncError> {
        self.check(token)?;

        let source_walker = LocalWalker::new(&self.source_root);
        let source = collect_entries(&source_walker).map_err(|e| SyncError::SourceWalk {
            root: self.source_root.clone(),
            source: Box::new(e),
        })?;

        self.check(token)?;

        let dest_walker = self
            .store
            .walk_tree(&self.dest_root)
            .and_then(|walker| collect_entries(walker.as_ref()));
        let dest = dest_walker.map_err(|e| SyncError::DestinationWalk {
            root: self.dest_root.clone(),
            source: Box::new(e),
        })?;

        let diff = self.differ.diff(&source, &dest);
        debug!(
            job = %self.name,
            source_entries = source.len(),
            dest_entries = dest.len(),
            actions = diff.len(),
            "diff computed"
        );

        self.syncer
            .sync(&diff, &self.source_root, &self.dest_root, token)
    }

    /// Record the run's result and build its event.
    fn finish(&self, result: Result<SyncOutcome, SyncError>) -> JobEvent {
        let mut state = self.state();

        match result {
            Ok(outcome) if outcome.is_clean() => {
                state.status = JobStatus::Succeeded;
                state.last_outcome = Some(outcome.clone());
                state.last_error = None;
                JobEvent {
                    job: self.name.clone(),
                    status: JobStatus::Succeeded,
                    outcome: Some(outcome),
                    error: None,
                }
            }
            Ok(outcome) => {
                let error = Arc::new(SyncError::Partial {
                    count: outcome.errors.len(),
                });
                state.status = JobStatus::Failed;
                state.last_outcome = Some(outcome.clone());
                state.last_error = Some(error.clone());
                JobEvent {
                    job: self.name.clone(),
                    status: JobStatus::Failed,
                    outcome: Some(outcome),
                    error: Some(error),
                }
            }
            Err(e) => {
                // An interrupted run still produced a partial outcome worth
                // keeping; an enumeration failure produced none, and the
                // previous run's outcome stays as the last known good one.
                let partial = match &e {
                    SyncError::Interrupted { partial, .. } => Some((**partial).clone()),
                    _ => None,
                };
                let error = Arc::new(e);
                state.status = JobStatus::Failed;
                state.last_error = Some(error.clone());
                if let Some(partial) = &partial {
                    state.last_outcome = Some(partial.clone());
                }
                JobEvent {
                    job: self.name.clone(),
                    status: JobStatus::Failed,
                    outcome: partial,
                    error: Some(error),
                }
            }
        }
    }

    fn check(&self, token: &RunToken) -> Result<(), SyncError> {
        token.check().map_err(|reason| SyncError::Interrupted {
            reason,
            partial: Box::new(SyncOutcome::default()),
        })
    }

    fn state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use std::fs;

    fn local_job(name: &str, src: &Path, dst: &Path) -> Job {
        Job::new(name, src, dst, Arc::new(LocalStore::new()))
    }

    #[test]
    fn test_first_run_copies_everything() {
        let src = tempfile::tempdir().expect("src tempdir");
        let dst = tempfile::tempdir().expect("dst tempdir");
        fs::write(src.path().join("a.txt"), b"0123456789").expect("seed source");

        let job = local_job("mirror", src.path(), dst.path());
        assert_eq!(job.snapshot().status, JobStatus::Idle);

        let event = job.run(&RunToken::detached());

        assert_eq!(event.status, JobStatus::Succeeded);
        assert!(event.error.is_none());
        let outcome = event.outcome.expect("outcome");
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.bytes_transferred, 10);
        assert_eq!(fs::read(dst.path().join("a.txt")).expect("read dst"), b"0123456789");

        let snap = job.snapshot();
        assert_eq!(snap.status, JobStatus::Succeeded);
        assert!(snap.last_run_at.is_some());
        assert!(snap.last_error.is_none());
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let src = tempfile::tempdir().expect("src tempdir");
        let dst = tempfile::tempdir().expect("dst tempdir");
        fs::write(src.path().join("a.txt"), b"stable").expect("seed source");

        let job = local_job("mirror", src.path(), dst.path());
        job.run(&RunToken::detached());
        let event = job.run(&RunToken::detached());

        assert_eq!(event.status, JobStatus::Succeeded);
        let outcome = event.outcome.expect("outcome");
        assert_eq!(outcome.total_applied(), 0, "mirrored tree needs no actions");
    }

    #[test]
    fn test_missing_source_fails_before_sync() {
        let dst = tempfile::tempdir().expect("dst tempdir");
        let job = local_job("mirror", Path::new("/definitely/not/here"), dst.path());

        let event = job.run(&RunToken::detached());

        assert_eq!(event.status, JobStatus::Failed);
        assert!(event.outcome.is_none(), "no sync was attempted");
        let error = event.error.expect("error");
        assert!(error.is_enumeration_failure());

        let snap = job.snapshot();
        assert_eq!(snap.status, JobStatus::Failed);
        assert!(snap.last_error.expect("last_error").contains("walk source"));
    }

    #[test]
    fn test_partial_errors_aggregate() {
        let src = tempfile::tempdir().expect("src tempdir");
        let dst = tempfile::tempdir().expect("dst tempdir");
        fs::write(src.path().join("a.txt"), b"aa").expect("seed a");
        fs::write(src.path().join("b.txt"), b"bb").expect("seed b");

        // A destination under a plain file rejects every write.
        let blocked = dst.path().join("blocked");
        fs::write(&blocked, b"i am a file, not a directory").expect("seed blocker");
        let job = local_job("blocked", src.path(), &blocked.join("sub"));

        let event = job.run(&RunToken::detached());
        assert_eq!(event.status, JobStatus::Failed);
        let outcome = event.outcome.expect("outcome");
        assert_eq!(outcome.errors.len(), 2);
        let error = event.error.expect("error");
        assert_eq!(error.to_string(), "2 errors during sync");
    }

    #[test]
    fn test_cancelled_run_reports_interruption() {
        let src = tempfile::tempdir().expect("src tempdir");
        let dst = tempfile::tempdir().expect("dst tempdir");
        fs::write(src.path().join("a.txt"), b"x").expect("seed source");

        let token = RunToken::detached();
        token.cancel();
        let job = local_job("mirror", src.path(), dst.path());
        let event = job.run(&token);

        assert_eq!(event.status, JobStatus::Failed);
        assert!(event.error.expect("error").is_interruption());
    }

    #[test]
    fn test_run_guard_is_exclusive_and_released() {
        let src = tempfile::tempdir().expect("src tempdir");
        let dst = tempfile::tempdir().expect("dst tempdir");
        let job = local_job("mirror", src.path(), dst.path());

        assert!(job.try_begin());
        assert!(!job.try_begin(), "second claim must fail");
        job.run(&RunToken::detached());
        assert!(job.try_begin(), "run releases the claim");
        job.release();
    }

    #[test]
    fn test_skipped_event_shape() {
        let event = JobEvent::skipped("mirror", JobStatus::Running);
        assert_eq!(event.job, "mirror");
        assert_eq!(event.status, JobStatus::Running);
        assert!(event.outcome.is_none());
        assert!(matches!(
            event.error.as_deref(),
            Some(SyncError::JobAlreadyRunning(name)) if name == "mirror"
        ));
    }

    #[test]
    fn test_skipped_event_carries_observed_status() {
        // A claimed job still queued behind the concurrency limit has not
        // started running; the skip event must not pretend otherwise.
        let event = JobEvent::skipped("queued", JobStatus::Idle);
        assert_eq!(event.status, JobStatus::Idle);
    }
}
