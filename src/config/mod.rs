//! Configuration model
//!
//! Schema only: loading and saving job definitions belongs to whoever embeds
//! the engine. The dispatcher consumes this model as-is.

use crate::types::SyncError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configured mirroring jobs, in declaration order
    pub jobs: Vec<JobConfig>,

    /// Seconds between scheduled run-all waves
    pub check_interval_secs: u64,

    /// Per-run time budget in seconds; an overrunning job is cancelled
    pub run_timeout_secs: u64,

    /// Upper bound on concurrently executing jobs; extra launches queue
    pub max_concurrent_jobs: usize,

    /// Delete destination files with no source counterpart
    pub delete_extra_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            check_interval_secs: 5 * 60,
            run_timeout_secs: 30 * 60,
            max_concurrent_jobs: 4,
            delete_extra_files: false,
        }
    }
}

impl Config {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Sanity-check the model before handing it to the dispatcher.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.max_concurrent_jobs == 0 {
            return Err(SyncError::Config(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        for job in &self.jobs {
            if job.name.is_empty() {
                return Err(SyncError::Config("job name cannot be empty".to_string()));
            }
            if job.source_path == job.destination_path {
                return Err(SyncError::Config(format!(
                    "job {}: source and destination cannot be the same",
                    job.name
                )));
            }
        }
        Ok(())
    }
}

/// One configured mirroring pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique identifier; a duplicate name overwrites the earlier entry
    pub name: String,

    /// Local directory to mirror from
    pub source_path: PathBuf,

    /// Directory (local or on a remote store) to mirror onto
    pub destination_path: PathBuf,

    /// Disabled entries are kept in the config but never become jobs
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How this job is meant to be triggered. Carried for presentation
    /// layers; scheduled waves run every registered job either way.
    #[serde(default)]
    pub schedule: Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Manual,
    #[default]
    Interval,
}

fn default_enabled() -> bool {
    true
}
