//! Diff computation over two tree enumerations

use super::compare::needs_update;
use crate::types::FileEntry;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;

/// One required action on one relative path.
///
/// The variants carry the entries that justify them: a `Create` always has
/// the source entry, an `Update` has both sides, a `Delete` has the orphaned
/// destination entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffAction {
    /// Present at source, absent at destination
    Create(FileEntry),

    /// Present at both ends with differing metadata
    Update { source: FileEntry, dest: FileEntry },

    /// Present at destination only (emitted only when deletes are enabled)
    Delete(FileEntry),
}

impl DiffAction {
    /// Relative path this action targets.
    pub fn path(&self) -> &Utf8Path {
        match self {
            DiffAction::Create(entry) => &entry.path,
            DiffAction::Update { source, .. } => &source.path,
            DiffAction::Delete(entry) => &entry.path,
        }
    }

    /// Short label used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            DiffAction::Create(_) => "create",
            DiffAction::Update { .. } => "update",
            DiffAction::Delete(_) => "delete",
        }
    }
}

/// Ordered list of actions needed to make the destination match the source.
///
/// Sparse: paths already in sync produce no entry at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    pub actions: Vec<DiffAction>,
}

impl DiffResult {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiffAction> {
        self.actions.iter()
    }
}

/// Compares source and destination enumerations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Differ {
    /// When set, destination entries with no source counterpart are deleted.
    /// Off by default: leaving extra files alone is the safe behavior.
    pub delete_extra_files: bool,
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_extra_files(delete_extra_files: bool) -> Self {
        Self { delete_extra_files }
    }

    /// Compute the actions required to mirror `source` onto `dest`.
    ///
    /// Pure and deterministic: creates and updates come first, sorted by
    /// path, followed by deletes sorted by path. Duplicate paths within one
    /// enumeration are tolerated with last-write-wins, though a well-formed
    /// walker never produces them.
    pub fn diff(&self, source: &[FileEntry], dest: &[FileEntry]) -> DiffResult {
        let source_index = index_by_path(source);
        let dest_index = index_by_path(dest);

        let mut actions = Vec::new();

        for (path, src_entry) in &source_index {
            match dest_index.get(path) {
                None => actions.push(DiffAction::Create((*src_entry).clone())),
                Some(dest_entry) if needs_update(src_entry, dest_entry) => {
                    actions.push(DiffAction::Update {
                        source: (*src_entry).clone(),
                        dest: (*dest_entry).clone(),
                    });
                }
                Some(_) => {} // already in sync
            }
        }

        if self.delete_extra_files {
            for (path, dest_entry) in &dest_index {
                if !source_index.contains_key(path) {
                    actions.push(DiffAction::Delete((*dest_entry).clone()));
                }
            }
        }

        DiffResult { actions }
    }
}

fn index_by_path(entries: &[FileEntry]) -> BTreeMap<Utf8PathBuf, &FileEntry> {
    entries.iter().map(|e| (e.path.clone(), e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn file(path: &str, size: u64, mtime_secs: u64) -> FileEntry {
        FileEntry::file(path, size, at(mtime_secs))
    }

    #[test]
    fn test_identical_trees_produce_empty_diff() {
        let entries = vec![
            file("a.txt", 10, 100),
            file("b.txt", 20, 200),
            FileEntry::dir("sub", at(50)),
        ];
        let differ = Differ::with_delete_extra_files(true);
        assert!(differ.diff(&entries, &entries).is_empty());
    }

    #[test]
    fn test_source_only_entry_creates() {
        let source = vec![file("a.txt", 10, 100)];
        let diff = Differ::new().diff(&source, &[]);

        assert_eq!(diff.len(), 1);
        assert!(matches!(&diff.actions[0], DiffAction::Create(e) if e.path == "a.txt"));
    }

    #[test]
    fn test_source_newer_same_size_updates() {
        let source = vec![file("a.txt", 10, 200)];
        let dest = vec![file("a.txt", 10, 100)];
        let diff = Differ::new().diff(&source, &dest);

        assert_eq!(diff.len(), 1);
        assert!(matches!(&diff.actions[0], DiffAction::Update { .. }));
        assert_eq!(diff.actions[0].kind(), "update");
    }

    #[test]
    fn test_extra_destination_file_kept_by_default() {
        let dest = vec![file("old.txt", 5, 100)];
        let diff = Differ::new().diff(&[], &dest);
        assert!(diff.is_empty(), "no Delete without delete_extra_files");
    }

    #[test]
    fn test_delete_extra_files_emits_delete() {
        let dest = vec![file("old.txt", 5, 100)];
        let diff = Differ::with_delete_extra_files(true).diff(&[], &dest);

        assert_eq!(diff.len(), 1);
        assert!(matches!(&diff.actions[0], DiffAction::Delete(e) if e.path == "old.txt"));
    }

    #[test]
    fn test_in_sync_entry_never_deleted() {
        let shared = vec![file("same.txt", 10, 100)];
        let diff = Differ::with_delete_extra_files(true).diff(&shared, &shared);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_directory_mtime_drift_is_ignored() {
        let source = vec![FileEntry::dir("sub", at(500))];
        let dest = vec![FileEntry::dir("sub", at(100))];
        let diff = Differ::new().diff(&source, &dest);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_ordering_creates_then_deletes_sorted_by_path() {
        let source = vec![file("z-new.txt", 1, 100), file("a-new.txt", 1, 100)];
        let dest = vec![file("m-old.txt", 1, 100), file("b-old.txt", 1, 100)];
        let diff = Differ::with_delete_extra_files(true).diff(&source, &dest);

        let labels: Vec<(&str, &str)> = diff
            .iter()
            .map(|a| (a.kind(), a.path().as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("create", "a-new.txt"),
                ("create", "z-new.txt"),
                ("delete", "b-old.txt"),
                ("delete", "m-old.txt"),
            ]
        );
    }

    #[test]
    fn test_duplicate_paths_last_write_wins() {
        let source = vec![file("dup.txt", 10, 100), file("dup.txt", 99, 100)];
        let dest = vec![file("dup.txt", 99, 100)];
        let diff = Differ::new().diff(&source, &dest);
        assert!(diff.is_empty(), "last duplicate matches the destination");
    }

    #[test]
    fn test_mixed_tree_scenario() {
        let source = vec![
            file("new.txt", 10, 100),
            file("changed.txt", 10, 300),
            file("same.txt", 5, 100),
            FileEntry::dir("docs", at(100)),
        ];
        let dest = vec![
            file("changed.txt", 10, 100),
            file("same.txt", 5, 100),
            file("extra.txt", 3, 100),
            FileEntry::dir("docs", at(90)),
        ];

        let diff = Differ::with_delete_extra_files(true).diff(&source, &dest);
        let labels: Vec<(&str, &str)> = diff
            .iter()
            .map(|a| (a.kind(), a.path().as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("update", "changed.txt"),
                ("create", "new.txt"),
                ("delete", "extra.txt"),
            ]
        );
    }
}
