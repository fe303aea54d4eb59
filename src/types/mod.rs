//! Core type definitions for treemirror

mod entry;
mod error;
mod outcome;

pub use entry::FileEntry;
pub use error::SyncError;
pub use outcome::{ItemError, JobStatus, SyncOutcome};
