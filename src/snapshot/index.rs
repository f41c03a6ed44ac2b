//! Searchable catalog of snapshots and its persistence.
//!
//! The canonical default root holds:
//!
//! ```text
//! <root>/index.json   # JSON array of IndexEntry
//! <root>/roots.json   # JSON array of alternate storage roots ever used
//! <root>/index.lock   # advisory lock guarding load-mutate-persist
//! ```
//!
//! A document that cannot be read or parsed is renamed to
//! `<name>.corrupt-<time>` and treated as empty; the caller gets a
//! [`Quarantine`] record to surface.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::schema::IndexEntry;
use crate::error::{IoResultExt, Result, VtError};
use crate::identity::FileIdentity;
use crate::safe_io::{FileLock, atomic_write_json};

pub const INDEX_FILE: &str = "index.json";
pub const ROOTS_FILE: &str = "roots.json";
pub const LOCK_FILE: &str = "index.lock";

/// In-memory index: snapshot entries plus the alternate roots they may live in.
///
/// Entry order is insertion order and carries no meaning beyond tie-breaking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    entries: Vec<IndexEntry>,
    alternate_roots: BTreeSet<PathBuf>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, entry: IndexEntry) {
        self.entries.push(entry);
    }

    /// Entries belonging to `identity`, in insertion order.
    pub fn filter<'a>(&'a self, identity: &'a FileIdentity) -> impl Iterator<Item = &'a IndexEntry> {
        self.entries.iter().filter(move |e| &e.file_id == identity)
    }

    pub fn find_by_path(&self, version_path: &Path) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.version_file_path == version_path)
    }

    pub fn contains_path(&self, version_path: &Path) -> bool {
        self.find_by_path(version_path).is_some()
    }

    /// The entry whose copied file lives directly in `snapshot_dir`.
    pub fn find_in_dir(&self, snapshot_dir: &Path) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.version_file_path.parent() == Some(snapshot_dir))
    }

    /// Removes every entry whose copied file lives directly in
    /// `snapshot_dir`. Returns how many were removed.
    pub fn remove_in_dir(&mut self, snapshot_dir: &Path) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.version_file_path.parent() != Some(snapshot_dir));
        before - self.entries.len()
    }

    pub fn alternate_roots(&self) -> impl Iterator<Item = &Path> {
        self.alternate_roots.iter().map(PathBuf::as_path)
    }

    /// Records an alternate storage root. Returns true if it was new.
    pub fn register_root(&mut self, root: PathBuf) -> bool {
        self.alternate_roots.insert(root)
    }
}

/// A corrupt document that was moved aside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quarantine {
    pub original: PathBuf,
    pub moved_to: PathBuf,
    pub reason: String,
}

/// Result of [`IndexFile::load`].
#[derive(Debug, Default)]
pub struct LoadedIndex {
    pub index: Index,
    pub quarantined: Vec<Quarantine>,
}

/// Location of the index documents for one default storage root.
#[derive(Debug, Clone)]
pub struct IndexFile {
    dir: PathBuf,
}

impl IndexFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn roots_path(&self) -> PathBuf {
        self.dir.join(ROOTS_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Takes the exclusive index lock, blocking until it is free.
    pub fn lock(&self) -> Result<FileLock> {
        let path = self.lock_path();
        FileLock::acquire(&path).io_context(|| format!("Failed to lock {}", path.display()))
    }

    /// Loads the index. Absent documents give an empty index; corrupt ones
    /// are quarantined.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load(&self) -> Result<LoadedIndex> {
        let mut quarantined = Vec::new();

        let entries: Vec<IndexEntry> = load_document(&self.index_path(), &mut quarantined)?;
        let roots: Vec<PathBuf> = load_document(&self.roots_path(), &mut quarantined)?;

        debug!(entries = entries.len(), roots = roots.len(), "Index loaded");
        Ok(LoadedIndex {
            index: Index {
                entries,
                alternate_roots: roots.into_iter().collect(),
            },
            quarantined,
        })
    }

    /// Writes both documents atomically.
    #[instrument(skip(self, index), fields(dir = %self.dir.display(), entries = index.len()))]
    pub fn persist(&self, index: &Index) -> Result<()> {
        let index_path = self.index_path();
        atomic_write_json(&index_path, &index.entries)
            .io_context(|| format!("Failed to write {}", index_path.display()))?;

        let roots_path = self.roots_path();
        if !index.alternate_roots.is_empty() || roots_path.exists() {
            atomic_write_json(&roots_path, &index.alternate_roots)
                .io_context(|| format!("Failed to write {}", roots_path.display()))?;
        }
        debug!("Index persisted");
        Ok(())
    }
}

fn load_document<T: DeserializeOwned + Default>(
    path: &Path,
    quarantined: &mut Vec<Quarantine>,
) -> Result<T> {
    let reason = match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(value) => return Ok(value),
            Err(e) => e.to_string(),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => e.to_string(),
    };

    let moved_to = quarantine(path).map_err(|e| VtError::IndexCorrupt {
        path: path.display().to_string(),
        reason: format!("{reason}; moving it aside failed: {e}"),
    })?;
    warn!(
        path = %path.display(),
        moved_to = %moved_to.display(),
        reason = %reason,
        "Corrupt index document set aside"
    );
    quarantined.push(Quarantine {
        original: path.to_path_buf(),
        moved_to,
        reason,
    });
    Ok(T::default())
}

fn quarantine(path: &Path) -> io::Result<PathBuf> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", Local::now().format("%Y%m%dT%H%M%S%.6f")));
    let target = path.with_file_name(name);
    fs::rename(path, &target)?;
    info!(moved_to = %target.display(), "Quarantined index document");
    Ok(target)
}
