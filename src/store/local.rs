//! Local filesystem store with atomic replace

use super::RemoteStore;
use crate::scanner::{EmptyWalker, LocalWalker, Walker};
use crate::types::SyncError;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const COPY_BUFFER_SIZE: usize = 128 * 1024;

/// Destination store backed by the local filesystem.
///
/// `replace` uses the write-then-rename strategy: the new content goes to a
/// temporary file in the destination's own directory (same volume, so the
/// final move is a single rename syscall), and a failed write removes the
/// temporary file without touching the destination.
#[derive(Debug, Default, Clone)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteStore for LocalStore {
    fn connect(&self) -> Result<(), SyncError> {
        Ok(())
    }

    fn disconnect(&self) -> Result<(), SyncError> {
        Ok(())
    }

    fn walk_tree(&self, root: &Path) -> Result<Box<dyn Walker>, SyncError> {
        if root.exists() {
            Ok(Box::new(LocalWalker::new(root)))
        } else {
            Ok(Box::new(EmptyWalker))
        }
    }

    fn upload(
        &self,
        dest: &Path,
        src: &mut dyn Read,
        _size: u64,
        modified: SystemTime,
    ) -> Result<u64, SyncError> {
        let mut file = File::create(dest)?;
        let bytes = copy_stream(src, &mut file)?;
        file.sync_all()?;
        drop(file);

        set_mtime(dest, modified)?;
        Ok(bytes)
    }

    fn replace(
        &self,
        dest: &Path,
        src: &mut dyn Read,
        _size: u64,
        modified: SystemTime,
    ) -> Result<u64, SyncError> {
        let part_path = part_path_for(dest)?;

        let result = write_part_file(&part_path, src, modified);
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                // Leave the destination untouched; only the temp file dies.
                let _ = fs::remove_file(&part_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&part_path, dest) {
            let _ = fs::remove_file(&part_path);
            return Err(e.into());
        }

        Ok(bytes)
    }

    fn delete(&self, path: &Path) -> Result<(), SyncError> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            // Already gone counts as deleted.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if metadata.file_type().is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn make_dir_tree(&self, path: &Path) -> Result<(), SyncError> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}

fn write_part_file(
    part_path: &Path,
    src: &mut dyn Read,
    modified: SystemTime,
) -> Result<u64, SyncError> {
    let mut part_file = File::create(part_path)?;
    let bytes = copy_stream(src, &mut part_file)?;

    // Force the data to disk before the rename makes it visible.
    part_file.sync_all()?;
    drop(part_file);

    set_mtime(part_path, modified)?;
    Ok(bytes)
}

fn copy_stream(src: &mut dyn Read, dest: &mut dyn Write) -> Result<u64, SyncError> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let read = src.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        dest.write_all(&buffer[..read])?;
        total += read as u64;
    }
    Ok(total)
}

fn set_mtime(path: &Path, modified: SystemTime) -> Result<(), SyncError> {
    let mtime = filetime::FileTime::from_system_time(modified);
    filetime::set_file_mtime(path, mtime)?;
    Ok(())
}

/// Temporary path in the same directory as `dest`, so the rename stays on
/// one volume.
fn part_path_for(dest: &Path) -> Result<PathBuf, SyncError> {
    let parent = dest
        .parent()
        .ok_or_else(|| SyncError::InvalidPath(dest.to_path_buf()))?;
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SyncError::InvalidPath(dest.to_path_buf()))?;
    Ok(parent.join(format!(".{name}.part")))
}
