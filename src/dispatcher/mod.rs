//! Job dispatcher - concurrency and lifecycle coordination above jobs
//!
//! The dispatcher owns the authoritative job registry, launches executions
//! on demand and on a timer, republishes completed runs as a single event
//! stream, and drains everything on [`Dispatcher::stop`]. Coordination is
//! one shared [`CancellationToken`] for shutdown, a [`TaskTracker`] for the
//! graceful drain, and a bounded event queue.

use crate::cancel::RunToken;
use crate::config::Config;
use crate::job::{Job, JobEvent, JobSnapshot};
use crate::store::RemoteStore;
use crate::types::SyncError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, RwLock, Semaphore};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// Completed runs buffered for consumers; producers racing shutdown drop
/// events instead of blocking.
const EVENT_QUEUE_CAPACITY: usize = 100;

/// Runs, schedules and cancels jobs.
///
/// Cheap to clone handles are not provided; share the dispatcher itself
/// behind an `Arc` if multiple owners need it. All registry reads hand out
/// snapshots, never references into the map.
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    jobs: RwLock<BTreeMap<String, Arc<Job>>>,
    events: Mutex<Option<mpsc::Sender<JobEvent>>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
    run_timeout: Duration,
}

impl Dispatcher {
    /// Build a dispatcher and the receiving end of its event stream.
    ///
    /// The stream closes after [`Dispatcher::stop`] has drained all
    /// launched work.
    pub fn new(config: &Config) -> (Self, mpsc::Receiver<JobEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let dispatcher = Self {
            inner: Arc::new(Inner {
                jobs: RwLock::new(BTreeMap::new()),
                events: Mutex::new(Some(events_tx)),
                cancel: CancellationToken::new(),
                tracker: TaskTracker::new(),
                permits: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
                run_timeout: config.run_timeout(),
            }),
        };
        (dispatcher, events_rx)
    }

    /// Register a job. A job with the same name is replaced.
    pub async fn register(&self, job: Job) {
        let name = job.name().to_string();
        let replaced = self
            .inner
            .jobs
            .write()
            .await
            .insert(name.clone(), Arc::new(job));
        if replaced.is_some() {
            info!(job = %name, "job replaced in registry");
        } else {
            info!(job = %name, "job registered");
        }
    }

    /// Remove a job from the registry. An in-flight execution of it is
    /// unaffected and still emits its completion event.
    pub async fn remove(&self, name: &str) -> bool {
        self.inner.jobs.write().await.remove(name).is_some()
    }

    /// Replace the whole registry from a configuration: only enabled
    /// entries become jobs, duplicate names overwrite earlier ones.
    pub async fn load_config(&self, config: &Config, store: &Arc<dyn RemoteStore>) {
        let mut jobs = BTreeMap::new();
        for job_config in config.jobs.iter().filter(|j| j.enabled) {
            let job = Job::new(
                &job_config.name,
                &job_config.source_path,
                &job_config.destination_path,
                Arc::clone(store),
            )
            .with_delete_extra_files(config.delete_extra_files);
            jobs.insert(job_config.name.clone(), Arc::new(job));
        }
        let count = jobs.len();
        *self.inner.jobs.write().await = jobs;
        info!(jobs = count, "registry loaded from configuration");
    }

    /// Snapshot of one job's state.
    pub async fn job(&self, name: &str) -> Option<JobSnapshot> {
        self.inner.jobs.read().await.get(name).map(|j| j.snapshot())
    }

    /// Snapshots of every registered job, ordered by name.
    pub async fn jobs(&self) -> Vec<JobSnapshot> {
        self.inner
            .jobs
            .read()
            .await
            .values()
            .map(|j| j.snapshot())
            .collect()
    }

    /// Launch one job by name, fire-and-forget. The result is observable
    /// only through the event stream. Unknown names are a caller error and
    /// never reach the stream.
    pub async fn run_now(&self, name: &str) -> Result<(), SyncError> {
        let job = self
            .inner
            .jobs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::JobNotFound(name.to_string()))?;
        self.inner.dispatch(job).await;
        Ok(())
    }

    /// Launch every registered job. Fan-out is bounded by the configured
    /// concurrency limit; excess launches wait for a permit.
    pub async fn run_all(&self) {
        self.inner.run_all().await;
    }

    /// Start the periodic scheduler: one run-all wave every `interval`
    /// until the dispatcher stops. Waves launched while a previous wave is
    /// still executing are contained by the per-job guard and the permit
    /// limit rather than suppressed.
    pub fn start_scheduler(&self, interval: Duration) {
        let inner = Arc::clone(&self.inner);
        self.inner.tracker.spawn(async move {
            info!(interval_secs = interval.as_secs(), "scheduler started");
            let mut ticker = wave_ticker(interval);
            // The first tick completes immediately; waves should start one
            // interval from now.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = inner.cancel.cancelled() => {
                        debug!("scheduler stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        info!("scheduler tick: running all jobs");
                        inner.run_all().await;
                    }
                }
            }
        });
    }

    /// Cancel all in-flight executions and the scheduler, wait until every
    /// launched task has exited, then close the event stream.
    ///
    /// This is the only way to guarantee no execution mutates job state
    /// after shutdown. Safe to call more than once.
    pub async fn stop(&self) {
        info!("stopping dispatcher");
        self.inner.cancel.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        info!("dispatcher stopped");
    }
}

/// Ticker driving scheduled waves. A runtime stalled past one or more
/// intervals catches up with a single wave instead of firing the missed
/// ones back to back.
fn wave_ticker(interval: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker
}

impl Inner {
    async fn run_all(self: &Arc<Self>) {
        let jobs: Vec<Arc<Job>> = self.jobs.read().await.values().cloned().collect();
        debug!(jobs = jobs.len(), "dispatching wave");
        for job in jobs {
            self.dispatch(job).await;
        }
    }

    /// Launch one execution on its own task, honoring the per-job guard
    /// and the concurrency limit.
    async fn dispatch(self: &Arc<Self>, job: Arc<Job>) {
        if !job.try_begin() {
            debug!(job = job.name(), "launch skipped: already running");
            self.emit(JobEvent::skipped(job.name(), job.snapshot().status))
                .await;
            return;
        }

        let inner = Arc::clone(self);
        self.tracker.spawn(async move {
            let permit = tokio::select! {
                permit = Arc::clone(&inner.permits).acquire_owned() => {
                    match permit {
                        Ok(permit) => permit,
                        Err(_) => {
                            job.release();
                            return;
                        }
                    }
                }
                _ = inner.cancel.cancelled() => {
                    // Shutdown won before the run could start.
                    job.release();
                    return;
                }
            };

            let token = RunToken::with_deadline(&inner.cancel, inner.run_timeout);
            let run_job = Arc::clone(&job);
            let result = task::spawn_blocking(move || run_job.run(&token)).await;
            drop(permit);

            match result {
                Ok(event) => inner.emit(event).await,
                Err(e) => {
                    error!(job = job.name(), error = %e, "job execution task failed");
                    job.release();
                }
            }
        });
    }

    /// Push an event to the stream; drop it if shutdown is racing us.
    async fn emit(&self, event: JobEvent) {
        let sender = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(sender) = sender else {
            return;
        };

        tokio::select! {
            result = sender.send(event) => {
                if result.is_err() {
                    debug!("event dropped: stream closed");
                }
            }
            _ = self.cancel.cancelled() => {
                debug!("event dropped: dispatcher shutting down");
            }
        }
    }
}
