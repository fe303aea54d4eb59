//! Diff application - makes the destination match the source
//!
//! The [`Syncer`] walks a [`DiffResult`](crate::diff::DiffResult) in order
//! and applies each action through the injected
//! [`RemoteStore`](crate::store::RemoteStore). Per-item failures are
//! recorded and the batch continues; only cancellation or an expired run
//! budget stops it early. The batch is not transactional: actions applied
//! before an interruption stand.

use crate::cancel::RunToken;
use crate::diff::{DiffAction, DiffResult};
use crate::store::RemoteStore;
use crate::types::{FileEntry, ItemError, SyncError, SyncOutcome};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies diff actions against a source root and a destination store.
pub struct Syncer {
    store: Arc<dyn RemoteStore>,
}

impl Syncer {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Apply `diff` one action at a time.
    ///
    /// Checks the token before every action; on interruption returns
    /// [`SyncError::Interrupted`] carrying the partially-filled outcome.
    /// Everything else lands in the outcome: counts and bytes for successes,
    /// `(path, cause)` records for per-item failures.
    pub fn sync(
        &self,
        diff: &DiffResult,
        source_root: &Path,
        dest_root: &Path,
        token: &RunToken,
    ) -> Result<SyncOutcome, SyncError> {
        let mut outcome = SyncOutcome::default();

        for action in diff.iter() {
            if let Err(reason) = token.check() {
                debug!(
                    applied = outcome.total_applied(),
                    %reason,
                    "sync interrupted mid-batch"
                );
                return Err(SyncError::Interrupted {
                    reason,
                    partial: Box::new(outcome),
                });
            }

            let result = match action {
                DiffAction::Create(entry) => self
                    .create(entry, source_root, dest_root)
                    .map(|()| {
                        outcome.created += 1;
                        outcome.bytes_transferred += entry.size;
                    }),
                DiffAction::Update { source, .. } => self
                    .update(source, source_root, dest_root)
                    .map(|()| {
                        outcome.updated += 1;
                        outcome.bytes_transferred += source.size;
                    }),
                DiffAction::Delete(entry) => {
                    self.store
                        .delete(&dest_root.join(entry.path.as_std_path()))
                        .map(|()| {
                            outcome.deleted += 1;
                        })
                }
            };

            if let Err(e) = result {
                warn!(path = %action.path(), kind = action.kind(), error = %e, "sync action failed");
                outcome.errors.push(ItemError::new(action.path(), e));
            }
        }

        Ok(outcome)
    }

    fn create(&self, entry: &FileEntry, source_root: &Path, dest_root: &Path) -> Result<(), SyncError> {
        let dest_path = dest_root.join(entry.path.as_std_path());

        if entry.is_dir {
            return self.store.make_dir_tree(&dest_path);
        }

        if let Some(parent) = dest_path.parent() {
            self.store.make_dir_tree(parent)?;
        }

        let mut src_file = File::open(self.source_path(source_root, entry))?;
        self.store
            .upload(&dest_path, &mut src_file, entry.size, entry.modified)?;
        Ok(())
    }

    fn update(&self, source: &FileEntry, source_root: &Path, dest_root: &Path) -> Result<(), SyncError> {
        let dest_path = dest_root.join(source.path.as_std_path());

        if source.is_dir {
            return self.store.make_dir_tree(&dest_path);
        }

        let mut src_file = File::open(self.source_path(source_root, source))?;
        self.store
            .replace(&dest_path, &mut src_file, source.size, source.modified)?;
        Ok(())
    }

    fn source_path(&self, source_root: &Path, entry: &FileEntry) -> PathBuf {
        source_root.join(entry.path.as_std_path())
    }
}
