//! Tree walking - enumeration of source and destination trees

mod walker;

pub use walker::{EmptyWalker, LocalWalker};

use crate::types::{FileEntry, SyncError};

/// Visitor callback invoked once per walked entry.
pub type Visit<'a> = &'a mut dyn FnMut(FileEntry) -> Result<(), SyncError>;

/// Ordered enumeration of one tree root.
///
/// Implementations visit every non-root entry exactly once with a path
/// relative to the walked root, slash-normalized, and stop at the first
/// traversal error.
pub trait Walker: Send + Sync {
    fn walk(&self, visit: Visit<'_>) -> Result<(), SyncError>;
}

/// Collect a full walk into a vector. Convenience used by jobs and tests.
pub fn collect_entries(walker: &dyn Walker) -> Result<Vec<FileEntry>, SyncError> {
    let mut entries = Vec::new();
    walker.walk(&mut |entry| {
        entries.push(entry);
        Ok(())
    })?;
    Ok(entries)
}
