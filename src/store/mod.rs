//! Destination storage backends
//!
//! The sync core never touches a destination directly: it goes through the
//! [`RemoteStore`] capability set, so a local filesystem, a network-share
//! client, or a test double can be injected at construction time without the
//! core depending on any one of them.

mod local;
mod null;

pub use local::LocalStore;
pub use null::NullStore;

use crate::scanner::Walker;
use crate::types::SyncError;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

/// Capability set for a destination tree.
///
/// The sync core calls only `walk_tree`, `upload`, `replace`, `delete` and
/// `make_dir_tree`; connection lifecycle belongs to whoever owns the store.
pub trait RemoteStore: Send + Sync {
    /// Establish a connection. Must be called before other operations on
    /// backends that need one; a no-op for local storage.
    fn connect(&self) -> Result<(), SyncError>;

    /// Tear the connection down.
    fn disconnect(&self) -> Result<(), SyncError>;

    /// Walker over the destination tree rooted at `root`.
    ///
    /// A root that does not exist yet yields an empty walk, so the first
    /// sync of a fresh destination copies everything.
    fn walk_tree(&self, root: &Path) -> Result<Box<dyn Walker>, SyncError>;

    /// Write `size` bytes from `src` to a new object at `dest`.
    ///
    /// Backends stamp `modified` onto the written object where they can, so
    /// the mtime comparison stays stable across later runs.
    fn upload(
        &self,
        dest: &Path,
        src: &mut dyn Read,
        size: u64,
        modified: SystemTime,
    ) -> Result<u64, SyncError>;

    /// Replace the object at `dest` with the stream's content.
    ///
    /// Atomic on backends with same-volume rename: readers observe either
    /// the old complete content or the new one, never a partial write.
    /// Backends without atomic rename document this as best-effort and may
    /// overwrite in place.
    fn replace(
        &self,
        dest: &Path,
        src: &mut dyn Read,
        size: u64,
        modified: SystemTime,
    ) -> Result<u64, SyncError>;

    /// Remove the entry at `path`; directories are removed recursively.
    fn delete(&self, path: &Path) -> Result<(), SyncError>;

    /// Create the directory at `path` and any missing parents.
    fn make_dir_tree(&self, path: &Path) -> Result<(), SyncError>;
}
