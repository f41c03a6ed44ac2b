//! Reconciliation of the index with snapshot directories on disk.
//!
//! Walks `<root>/<identity>/<timestamp>/` and appends an index entry for every
//! complete snapshot directory whose copied file is not yet indexed. Entries
//! whose files have disappeared are left alone.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use super::index::Index;
use super::layout::{METADATA_FILE, SnapshotLayout};
use super::schema::{IndexEntry, SnapshotStamp};
use crate::error::{IoResultExt, Result};
use crate::identity::FileIdentity;

/// Outcome of reconciling one or more storage roots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Roots that were walked.
    pub roots_scanned: Vec<PathBuf>,
    /// Roots that were expected but do not exist.
    pub missing_roots: Vec<PathBuf>,
    /// Copied-file paths of entries added to the index.
    pub added: Vec<PathBuf>,
    /// Snapshot directories already present in the index.
    pub already_indexed: usize,
    /// Directories that could not be turned into an entry.
    pub skipped: Vec<SkippedDir>,
}

impl ScanReport {
    /// Returns true if the index was changed.
    pub fn has_additions(&self) -> bool {
        !self.added.is_empty()
    }
}

/// A snapshot directory the scanner could not use.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDir {
    pub path: PathBuf,
    pub reason: String,
}

/// Reconciles every root in `roots` into `index`.
pub fn reconcile<'a, I>(roots: I, index: &mut Index) -> Result<ScanReport>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut report = ScanReport::default();
    for root in roots {
        reconcile_root(root, index, &mut report)?;
    }
    if report.has_additions() {
        info!(added = report.added.len(), "Index repaired from disk");
    }
    Ok(report)
}

/// Reconciles a single storage root into `index`, accumulating into `report`.
#[instrument(skip(index, report), fields(root = %root.display()))]
pub fn reconcile_root(root: &Path, index: &mut Index, report: &mut ScanReport) -> Result<()> {
    let identity_dirs = match sorted_subdirs(root) {
        Ok(dirs) => dirs,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Storage root missing, skipping");
            report.missing_roots.push(root.to_path_buf());
            return Ok(());
        }
        Err(e) => return Err(e).io_context(|| format!("Failed to read {}", root.display())),
    };
    report.roots_scanned.push(root.to_path_buf());

    for identity_dir in identity_dirs {
        let snapshot_dirs = match sorted_subdirs(&identity_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                report.skipped.push(SkippedDir {
                    path: identity_dir,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for snapshot_dir in snapshot_dirs {
            match entry_from_dir(root, &identity_dir, &snapshot_dir) {
                Ok(entry) if index.contains_path(&entry.version_file_path) => {
                    trace!(path = %snapshot_dir.display(), "Already indexed");
                    report.already_indexed += 1;
                }
                Ok(entry) => {
                    debug!(path = %entry.version_file_path.display(), "Adding unindexed snapshot");
                    report.added.push(entry.version_file_path.clone());
                    index.append(entry);
                }
                Err(reason) => {
                    debug!(path = %snapshot_dir.display(), %reason, "Skipping snapshot directory");
                    report.skipped.push(SkippedDir {
                        path: snapshot_dir,
                        reason,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Builds an index entry from a snapshot directory, or explains why not.
fn entry_from_dir(
    root: &Path,
    identity_dir: &Path,
    snapshot_dir: &Path,
) -> std::result::Result<IndexEntry, String> {
    let dir_name = file_name_str(snapshot_dir)?;
    let timestamp: SnapshotStamp = dir_name
        .parse()
        .map_err(|_| "directory name is not a snapshot timestamp".to_string())?;

    let metadata = SnapshotLayout::read_metadata(snapshot_dir).map_err(|e| e.to_string())?;

    let file_name = match metadata.file_name.clone() {
        Some(name) if is_plain_file_name(&name) => name,
        Some(name) => return Err(format!("recorded file name {name:?} is not a plain file name")),
        None => sole_copied_file(snapshot_dir)?,
    };
    let version_file_path = snapshot_dir.join(&file_name);
    if !version_file_path.is_file() {
        return Err(format!("copied file {file_name} is missing"));
    }

    let file_id = match metadata.file_id.clone() {
        Some(id) => id,
        None => FileIdentity::new(file_name_str(identity_dir)?),
    };

    Ok(IndexEntry {
        file_id,
        file_name,
        version_file_path,
        timestamp,
        comment: metadata.comment,
        storage_location: root.to_path_buf(),
        metadata_path: snapshot_dir.join(METADATA_FILE),
        saved_at: metadata.saved_at,
        file_size: metadata.file_size,
        file_modified: metadata.file_modified,
        original_path: metadata.original_path,
    })
}

/// For metadata without `file_name`: the one file next to `metadata.json`.
fn sole_copied_file(snapshot_dir: &Path) -> std::result::Result<String, String> {
    let mut names = fs::read_dir(snapshot_dir)
        .map_err(|e| e.to_string())?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name != METADATA_FILE);

    match (names.next(), names.next()) {
        (Some(name), None) => Ok(name),
        (None, _) => Err("no copied file".to_string()),
        (Some(_), Some(_)) => Err("metadata has no file_name and several files exist".to_string()),
    }
}

/// A single normal path component that is not the metadata record.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
        && name != METADATA_FILE
}

fn file_name_str(path: &Path) -> std::result::Result<&str, String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| "directory name is not valid UTF-8".to_string())
}

/// Subdirectories of `dir`, sorted by name for deterministic processing.
fn sorted_subdirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
