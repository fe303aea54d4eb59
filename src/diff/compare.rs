//! Entry comparison

use crate::types::FileEntry;

/// Decide whether a destination entry must be rewritten from the source.
///
/// Metadata only, no I/O:
/// - directories never need an update, they either exist or they don't
/// - a size mismatch always means an update
/// - equal sizes update only when the source is strictly newer
///
/// Equal size with a source that is not newer counts as in sync. A same-size
/// edit that does not advance the modification time past the destination's
/// is missed by this heuristic; that approximation is deliberate and must
/// not be "fixed" without switching to content comparison.
pub fn needs_update(source: &FileEntry, dest: &FileEntry) -> bool {
    if source.is_dir {
        return false;
    }

    if source.size != dest.size {
        return true;
    }

    source.modified > dest.modified
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> std::time::SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_directories_never_update() {
        let src = FileEntry::dir("sub", at(200));
        let dest = FileEntry::dir("sub", at(100));
        assert!(!needs_update(&src, &dest));
    }

    #[test]
    fn test_size_mismatch_updates() {
        let src = FileEntry::file("a.txt", 10, at(100));
        let dest = FileEntry::file("a.txt", 12, at(100));
        assert!(needs_update(&src, &dest));
    }

    #[test]
    fn test_source_strictly_newer_updates() {
        let src = FileEntry::file("a.txt", 10, at(200));
        let dest = FileEntry::file("a.txt", 10, at(100));
        assert!(needs_update(&src, &dest));
    }

    #[test]
    fn test_equal_metadata_is_in_sync() {
        let src = FileEntry::file("a.txt", 10, at(100));
        let dest = FileEntry::file("a.txt", 10, at(100));
        assert!(!needs_update(&src, &dest));
    }

    #[test]
    fn test_destination_newer_is_left_alone() {
        let src = FileEntry::file("a.txt", 10, at(100));
        let dest = FileEntry::file("a.txt", 10, at(200));
        assert!(!needs_update(&src, &dest));
    }
}
