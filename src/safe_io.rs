//! Atomic writes and advisory file locking for the index documents.
//!
//! - [`atomic_write_json()`] writes to a `.tmp` sibling, fsyncs, then renames
//!   over the target, so readers see either the old or the new document.
//! - [`FileLock`] holds an exclusive fs2 lock until dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use fs2::FileExt;
use serde::Serialize;
use tracing::trace;

/// Atomically write `value` as pretty-printed JSON to `path`.
pub fn atomic_write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    atomic_write(path, &json)
}

/// Atomically write bytes to a file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(contents)?;
        writer.flush()?;
    }
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;
    trace!(path = %path.display(), bytes = contents.len(), "Atomic write complete");
    Ok(())
}

/// RAII exclusive lock on a dedicated lock file.
///
/// Advisory only: every process touching the index must take the same lock.
/// `acquire()` blocks until the lock is free.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock on `lock_path`, creating the file if needed.
    pub fn acquire(lock_path: &Path) -> io::Result<Self> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;

        file.lock_exclusive()?;
        trace!(path = %lock_path.display(), "Lock acquired");
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
