//! # treemirror - directory mirroring engine
//!
//! Mirrors a local directory tree onto a destination tree and keeps them in
//! sync on demand or on a schedule. The engine is built from small layers:
//! walkers enumerate trees, the differ decides what must move, the syncer
//! applies actions with atomic-write semantics, jobs orchestrate one full
//! cycle, and the dispatcher runs many jobs concurrently with cooperative
//! cancellation.
//!
//! Destination storage is pluggable: the [`store::RemoteStore`] trait
//! decouples the core from any one backend, with a real local-filesystem
//! implementation and a no-op stand-in for remote protocols.

pub mod cancel;
pub mod config;
pub mod diff;
pub mod dispatcher;
pub mod job;
pub mod scanner;
pub mod store;
pub mod syncer;
pub mod types;

// Re-export commonly used types
pub use cancel::{Interrupt, RunToken};
pub use config::{Config, JobConfig, Schedule};
pub use diff::{DiffAction, DiffResult, Differ};
pub use dispatcher::Dispatcher;
pub use job::{Job, JobEvent, JobSnapshot};
pub use store::{LocalStore, NullStore, RemoteStore};
pub use syncer::Syncer;
pub use types::{FileEntry, ItemError, JobStatus, SyncError, SyncOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
