//! Atomic file write helpers for registry state files.
//!
//! The bytes land in a temp file next to the destination, get synced, and
//! are renamed over the old file. A reader therefore sees either the previous
//! state or the new one, never a torn write. On Windows rename-over-existing
//! fails, so the old file is parked as `.bak` for the duration of the swap.

#[cfg(unix)]
use std::fs::File;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

/// How much durability to pay for on each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// `sync_all` the temp file before the rename and the parent directory after.
    #[default]
    Durable,
    /// Skip every fsync. Tests and scratch state only.
    Relaxed,
}

/// Restore `path` from `path.bak` if a previous swap was interrupted.
///
/// Returns `true` when a backup was moved back into place.
pub fn recover_backup(path: &Path) -> bool {
    let backup = path.with_extension("bak");
    if path.exists() || !backup.exists() {
        return false;
    }
    match fs::rename(&backup, path) {
        Ok(()) => {
            warn!(path = %path.display(), "Recovered state file from interrupted write");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), "Failed to recover .bak file: {e}");
            false
        }
    }
}

pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write_with(path, bytes, SyncPolicy::default())
}

pub fn atomic_write_with(path: impl AsRef<Path>, bytes: &[u8], policy: SyncPolicy) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if policy == SyncPolicy::Durable {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup = path.with_extension("bak");
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;

        if let Err(retry) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(retry.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            warn!(path = %backup.display(), "Failed to remove .bak after atomic write: {e}");
        }
    }

    if policy == SyncPolicy::Durable {
        sync_dir_best_effort(parent);
    }
    Ok(())
}

fn sync_dir_best_effort(dir: &Path) {
    #[cfg(unix)]
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(path = %dir.display(), "Directory sync failed (best-effort): {e}");
    }
    #[cfg(not(unix))]
    let _ = dir;
}
