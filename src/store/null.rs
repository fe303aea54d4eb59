//! No-op stand-in for a remote protocol client

use super::RemoteStore;
use crate::scanner::{EmptyWalker, Walker};
use crate::types::SyncError;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

/// Placeholder destination store.
///
/// Accepts every operation and stores nothing. Stands where a real
/// network-share client would be injected; also useful as a sink in tests
/// that only care about the diff side of a run.
#[derive(Debug, Default, Clone)]
pub struct NullStore;

impl NullStore {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteStore for NullStore {
    fn connect(&self) -> Result<(), SyncError> {
        Ok(())
    }

    fn disconnect(&self) -> Result<(), SyncError> {
        Ok(())
    }

    fn walk_tree(&self, _root: &Path) -> Result<Box<dyn Walker>, SyncError> {
        Ok(Box::new(EmptyWalker))
    }

    fn upload(
        &self,
        _dest: &Path,
        src: &mut dyn Read,
        _size: u64,
        _modified: SystemTime,
    ) -> Result<u64, SyncError> {
        // Drain the stream the way a real upload would.
        Ok(std::io::copy(src, &mut std::io::sink())?)
    }

    fn replace(
        &self,
        dest: &Path,
        src: &mut dyn Read,
        size: u64,
        modified: SystemTime,
    ) -> Result<u64, SyncError> {
        // No rename to be atomic with; overwrite semantics are all it has.
        self.upload(dest, src, size, modified)
    }

    fn delete(&self, _path: &Path) -> Result<(), SyncError> {
        Ok(())
    }

    fn make_dir_tree(&self, _path: &Path) -> Result<(), SyncError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_null_store_accepts_everything() {
        let store = NullStore::new();
        let dest = Path::new("anywhere/file.txt");

        store.connect().expect("connect");
        let bytes = store
            .upload(dest, &mut Cursor::new(b"data".to_vec()), 4, UNIX_EPOCH)
            .expect("upload");
        assert_eq!(bytes, 4);
        store.delete(dest).expect("delete");
        store.make_dir_tree(Path::new("a/b/c")).expect("mkdir");
        store.disconnect().expect("disconnect");
    }

    #[test]
    fn test_null_store_walk_is_empty() {
        let store = NullStore::new();
        let walker = store.walk_tree(Path::new("share/root")).expect("walk_tree");
        let entries = crate::scanner::collect_entries(walker.as_ref()).expect("walk");
        assert!(entries.is_empty());
    }
}
