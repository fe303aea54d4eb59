//! Local filesystem walker

use super::{Visit, Walker};
use crate::types::{FileEntry, SyncError};
use camino::Utf8PathBuf;
use std::path::{Path, PathBuf};

/// Walks a local directory tree.
///
/// Uses the `ignore` crate's walker with all standard filters disabled: a
/// mirror must see every entry, including hidden files and anything a
/// `.gitignore` would exclude.
pub struct LocalWalker {
    root: PathBuf,
}

impl LocalWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Walker for LocalWalker {
    fn walk(&self, visit: Visit<'_>) -> Result<(), SyncError> {
        let walker = ignore::WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(std::ffi::OsStr::cmp)
            .build();

        for result in walker {
            let entry = result.map_err(|e| SyncError::Io(std::io::Error::other(e)))?;

            // The walk yields the root itself first; callers only want its contents.
            if entry.depth() == 0 {
                continue;
            }

            let file_type = match entry.file_type() {
                Some(ft) => ft,
                None => continue,
            };
            // Pipes, sockets and other special files cannot be mirrored.
            if !file_type.is_dir() && !file_type.is_file() {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                SyncError::Io(std::io::Error::other(format!(
                    "metadata for {}: {}",
                    entry.path().display(),
                    e
                )))
            })?;

            let relative = relative_slash_path(entry.path(), &self.root)?;
            let modified = metadata.modified()?;

            let file_entry = if file_type.is_dir() {
                FileEntry::dir(relative, modified)
            } else {
                FileEntry::file(relative, metadata.len(), modified)
            };

            visit(file_entry)?;
        }

        Ok(())
    }
}

/// Walker over nothing. Stands in for a destination that does not exist yet
/// or a remote store with no walk support: the first sync copies everything.
pub struct EmptyWalker;

impl Walker for EmptyWalker {
    fn walk(&self, _visit: Visit<'_>) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Strip `root` from `path` and normalize separators to `/`.
fn relative_slash_path(path: &Path, root: &Path) -> Result<Utf8PathBuf, SyncError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| SyncError::InvalidPath(path.to_path_buf()))?;

    let mut normalized = Utf8PathBuf::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| SyncError::InvalidPath(path.to_path_buf()))?;
        normalized.push(part);
    }
    Ok(normalized)
}
