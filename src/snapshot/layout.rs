//! On-disk shape of one storage root.
//!
//! ```text
//! <root>/<file-identity>/<timestamp>/<original-file-name>   # snapshot bytes
//! <root>/<file-identity>/<timestamp>/metadata.json           # snapshot metadata
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use filetime::FileTime;
use tracing::{debug, instrument, trace};

use super::schema::{SnapshotMetadata, SnapshotStamp};
use crate::error::{IoResultExt, Result, VtError};
use crate::identity::FileIdentity;
use crate::safe_io::atomic_write_json;

/// Name of the hidden directory holding a storage root.
pub const STORE_DIR_NAME: &str = ".versiontracker";

/// Name of the per-snapshot metadata record.
pub const METADATA_FILE: &str = "metadata.json";

/// Upper bound on same-second collision suffixes tried for one identity.
const MAX_STAMP_COUNTER: u32 = 10_000;

/// Paths and directory operations for snapshots under one storage root.
#[derive(Debug, Clone)]
pub struct SnapshotLayout {
    root: PathBuf,
}

impl SnapshotLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<identity>`
    pub fn identity_dir(&self, identity: &FileIdentity) -> PathBuf {
        self.root.join(identity.as_str())
    }

    /// Creates a fresh, empty snapshot directory for `identity` stamped `at`.
    ///
    /// Directory creation is exclusive: if the stamp is taken, the next free
    /// `-N` suffix is used instead, so an existing snapshot is never reused.
    #[instrument(skip(self), fields(root = %self.root.display(), %identity))]
    pub fn create_snapshot_dir(
        &self,
        identity: &FileIdentity,
        at: DateTime<Local>,
    ) -> Result<(SnapshotStamp, PathBuf)> {
        let identity_dir = self.identity_dir(identity);
        fs::create_dir_all(&identity_dir)
            .io_context(|| format!("Failed to create {}", identity_dir.display()))?;

        let base = SnapshotStamp::at(at);
        for counter in 0..MAX_STAMP_COUNTER {
            let stamp = base.with_counter(counter);
            let dir = identity_dir.join(stamp.to_string());
            match fs::create_dir(&dir) {
                Ok(()) => {
                    debug!(stamp = %stamp, "Snapshot directory created");
                    return Ok((stamp, dir));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    trace!(stamp = %stamp, "Snapshot stamp taken, trying next");
                }
                Err(e) => {
                    return Err(VtError::IoContext {
                        context: format!("Failed to create {}", dir.display()),
                        source: e,
                    });
                }
            }
        }

        Err(VtError::Other(format!(
            "Too many versions saved within one second in {}",
            identity_dir.display()
        )))
    }

    /// Copies `source` into `snapshot_dir` under `file_name`, preserving its
    /// modification time. Returns the path of the copy.
    pub fn write_copy(source: &Path, snapshot_dir: &Path, file_name: &str) -> Result<PathBuf> {
        let target = snapshot_dir.join(file_name);
        copy_preserving_mtime(source, &target)?;
        Ok(target)
    }

    /// Writes `metadata.json` into `snapshot_dir`. Returns its path.
    pub fn write_metadata(snapshot_dir: &Path, metadata: &SnapshotMetadata) -> Result<PathBuf> {
        let path = snapshot_dir.join(METADATA_FILE);
        atomic_write_json(&path, metadata)
            .io_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Reads and parses `metadata.json` from `snapshot_dir`.
    pub fn read_metadata(snapshot_dir: &Path) -> Result<SnapshotMetadata> {
        let path = snapshot_dir.join(METADATA_FILE);
        let text = fs::read_to_string(&path)
            .io_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| VtError::Serialization(format!("{}: {e}", path.display())))
    }

    /// True if `dir` looks like a snapshot directory (has a metadata record).
    pub fn is_snapshot_dir(dir: &Path) -> bool {
        dir.join(METADATA_FILE).is_file()
    }
}

/// Copies `source` over `target` and gives `target` the source's mtime.
///
/// The modification time is best effort: filesystems that refuse it still
/// get the bytes.
pub fn copy_preserving_mtime(source: &Path, target: &Path) -> Result<u64> {
    let bytes = fs::copy(source, target).io_context(|| {
        format!("Failed to copy {} to {}", source.display(), target.display())
    })?;

    match fs::metadata(source) {
        Ok(metadata) => {
            let mtime = FileTime::from_last_modification_time(&metadata);
            if let Err(e) = filetime::set_file_mtime(target, mtime) {
                debug!(path = %target.display(), error = %e, "Could not preserve modification time");
            }
        }
        Err(e) => debug!(source = %source.display(), error = %e, "Could not read source mtime"),
    }
    Ok(bytes)
}
