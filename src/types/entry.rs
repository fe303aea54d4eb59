//! FileEntry - one file or directory produced by a tree walk

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Metadata for a single entry in a walked tree.
///
/// `path` is relative to the walked root and slash-separated, so entries
/// from a local walk and a remote walk compare directly. A well-formed
/// walker never emits the same path twice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    /// Relative path from the walk root
    pub path: Utf8PathBuf,

    /// Size in bytes (0 for directories)
    pub size: u64,

    /// Last modification time
    pub modified: SystemTime,

    /// True if this entry is a directory
    pub is_dir: bool,
}

impl FileEntry {
    /// Create an entry for a regular file
    pub fn file(path: impl Into<Utf8PathBuf>, size: u64, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
            is_dir: false,
        }
    }

    /// Create an entry for a directory
    pub fn dir(path: impl Into<Utf8PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            size: 0,
            modified,
            is_dir: true,
        }
    }
}
