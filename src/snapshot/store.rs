//! The version store: save, list, restore and remove snapshots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::index::{Index, IndexFile, Quarantine};
use super::layout::{SnapshotLayout, copy_preserving_mtime};
use super::scanner::{ScanReport, reconcile};
use super::schema::{IndexEntry, Snapshot, SnapshotMetadata};
use crate::config::{DEFAULT_BACKUP_SUFFIX, Settings, alternate_storage_root};
use crate::error::{IoResultExt, Result, VtError};
use crate::identity::{FileIdentity, IdentityResolver, IdentityStrategy};

/// Options for opening a [`VersionStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Default storage root; created if missing.
    pub root: PathBuf,
    pub identity: IdentityStrategy,
    pub backup_suffix: String,
}

impl StoreOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            identity: IdentityStrategy::Auto,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: IdentityStrategy) -> Self {
        self.identity = identity;
        self
    }

    /// Options from loaded settings, with an optional root override.
    pub fn from_settings(settings: &Settings, override_root: Option<&Path>) -> Result<Self> {
        Ok(Self {
            root: settings.effective_root(override_root)?,
            identity: settings.identity,
            backup_suffix: settings.backup_suffix.clone(),
        })
    }
}

/// Result of [`VersionStore::save`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Snapshot),
    /// The storage-location chooser was dismissed; nothing was written.
    Cancelled,
}

impl SaveOutcome {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Saved(snapshot) => Some(snapshot),
            Self::Cancelled => None,
        }
    }
}

/// Result of [`VersionStore::restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub version_path: PathBuf,
    pub destination: PathBuf,
    /// Copy of the destination taken before it was overwritten.
    pub backup: Option<PathBuf>,
}

/// Result of [`VersionStore::remove`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoveReport {
    pub version_path: PathBuf,
    pub snapshot_dir: PathBuf,
    /// The index entry that was dropped, if the snapshot was indexed.
    pub snapshot: Option<Snapshot>,
}

/// Owns the index for one default storage root.
///
/// Every mutation takes the index lock, reloads the document, applies the
/// change and persists it, so several processes can share one root.
#[derive(Debug)]
pub struct VersionStore {
    layout: SnapshotLayout,
    index_file: IndexFile,
    resolver: Box<dyn IdentityResolver>,
    index: Index,
    backup_suffix: String,
    quarantined: Vec<Quarantine>,
    last_scan: ScanReport,
}

impl VersionStore {
    /// Opens the store, creating the default root if needed, and reconciles
    /// the index with every known root before returning.
    #[instrument(skip_all, fields(root = %options.root.display()))]
    pub fn open(options: StoreOptions) -> Result<Self> {
        fs::create_dir_all(&options.root)
            .io_context(|| format!("Failed to create {}", options.root.display()))?;
        let root = options
            .root
            .canonicalize()
            .io_context(|| format!("Failed to resolve {}", options.root.display()))?;

        let resolver = options.identity.resolver()?;
        let index_file = IndexFile::new(&root);

        let mut store = Self {
            layout: SnapshotLayout::new(&root),
            index_file,
            resolver,
            index: Index::new(),
            backup_suffix: options.backup_suffix,
            quarantined: Vec::new(),
            last_scan: ScanReport::default(),
        };
        store.reindex()?;

        info!(
            root = %root.display(),
            entries = store.index.len(),
            resolver = store.resolver.name(),
            "Version store ready"
        );
        Ok(store)
    }

    /// Default storage root (canonical).
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn resolver(&self) -> &dyn IdentityResolver {
        self.resolver.as_ref()
    }

    pub fn backup_suffix(&self) -> &str {
        &self.backup_suffix
    }

    /// Corrupt index documents moved aside since the store was opened.
    pub fn quarantined(&self) -> &[Quarantine] {
        &self.quarantined
    }

    /// Report of the most recent reconciliation pass.
    pub fn last_scan(&self) -> &ScanReport {
        &self.last_scan
    }

    /// Resolves the identity of `path` with the configured resolver.
    pub fn identity_of(&self, path: &Path) -> Result<FileIdentity> {
        self.resolver.resolve(path)
    }

    /// Looks up an indexed snapshot by its copied-file path.
    pub fn find(&self, version_path: &Path) -> Option<Snapshot> {
        let version_path = canonical_version_path(version_path);
        self.index
            .find_by_path(&version_path)
            .cloned()
            .map(Snapshot::from)
    }

    /// Saves a new snapshot of `path`.
    ///
    /// `storage_root` selects an alternate location (its hidden subdirectory
    /// holds the snapshot). An empty path means the chooser was cancelled and
    /// returns [`SaveOutcome::Cancelled`] without touching the disk.
    #[instrument(skip(self, comment), fields(path = %path.display()))]
    pub fn save(
        &mut self,
        path: &Path,
        comment: &str,
        storage_root: Option<&Path>,
    ) -> Result<SaveOutcome> {
        if storage_root.is_some_and(|root| root.as_os_str().is_empty()) {
            info!("Save cancelled");
            return Ok(SaveOutcome::Cancelled);
        }

        let source = path.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VtError::source_not_found(path),
            _ => VtError::PathUnavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;
        let source_meta =
            fs::metadata(&source).io_context(|| format!("Failed to read {}", source.display()))?;
        if !source_meta.is_file() {
            return Err(VtError::Other(format!(
                "{} is not a regular file",
                source.display()
            )));
        }
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| VtError::PathUnavailable {
                path: source.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?
            .to_string();

        let identity = self.resolver.resolve(&source)?;

        let root = match storage_root {
            Some(chosen) => alternate_storage_root(chosen)?,
            None => self.root().to_path_buf(),
        };
        let is_alternate = root != self.root();
        let layout = SnapshotLayout::new(&root);

        let saved_at = Local::now();
        let (timestamp, snapshot_dir) = layout.create_snapshot_dir(&identity, saved_at)?;
        let version_path = SnapshotLayout::write_copy(&source, &snapshot_dir, &file_name)?;
        let file_size = fs::metadata(&version_path)
            .io_context(|| format!("Failed to read {}", version_path.display()))?
            .len();
        let file_modified = source_meta
            .modified()
            .map_or(saved_at, DateTime::<Local>::from);

        let metadata = SnapshotMetadata {
            saved_at,
            file_size,
            file_modified,
            comment: comment.to_string(),
            file_id: Some(identity.clone()),
            file_name: Some(file_name.clone()),
            original_path: Some(source.clone()),
        };
        let metadata_path = SnapshotLayout::write_metadata(&snapshot_dir, &metadata)?;

        let snapshot = Snapshot {
            file_id: identity,
            file_name,
            timestamp,
            saved_at,
            file_size,
            file_modified,
            comment: metadata.comment,
            version_path,
            metadata_path,
            storage_root: root.clone(),
            original_path: Some(source),
        };

        let entry = IndexEntry::from(&snapshot);
        self.commit(move |index| {
            // A reload that had to reconcile may already hold this snapshot.
            if !index.contains_path(&entry.version_file_path) {
                index.append(entry);
            }
            if is_alternate && index.register_root(root.clone()) {
                info!(root = %root.display(), "Registered alternate storage root");
            }
        })?;

        info!(
            timestamp = %snapshot.timestamp,
            size = snapshot.file_size,
            path = %snapshot.version_path.display(),
            "Version saved"
        );
        Ok(SaveOutcome::Saved(snapshot))
    }

    /// Snapshots of the file at `path`, newest first.
    ///
    /// Empty if the identity cannot be resolved or nothing matches.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn list(&self, path: &Path) -> Vec<Snapshot> {
        let identity = match self.resolver.resolve(path) {
            Ok(identity) => identity,
            Err(e) => {
                debug!(error = %e, "No identity, no versions");
                return Vec::new();
            }
        };

        let mut snapshots: Vec<Snapshot> = self
            .index
            .filter(&identity)
            .cloned()
            .map(Snapshot::from)
            .collect();
        // Wall-clock stamps can repeat across a DST fall-back, so order by
        // instant first. Stable: full ties keep index order.
        snapshots.sort_by(|a, b| {
            b.saved_at
                .cmp(&a.saved_at)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        debug!(%identity, count = snapshots.len(), "Versions listed");
        snapshots
    }

    /// Copies a snapshot back over `destination`.
    ///
    /// An existing destination is first copied to a sibling named
    /// `<name><backup_suffix>`.
    #[instrument(skip(self), fields(version = %version_path.display(), dest = %destination.display()))]
    pub fn restore(&self, version_path: &Path, destination: &Path) -> Result<RestoreReport> {
        if !version_path.is_file() {
            return Err(VtError::snapshot_not_found(version_path));
        }
        self.check_restore_target(version_path, destination)?;

        let backup = if destination.is_file() {
            let backup = backup_path(destination, &self.backup_suffix)?;
            copy_preserving_mtime(destination, &backup)?;
            debug!(backup = %backup.display(), "Backed up destination");
            Some(backup)
        } else {
            None
        };

        copy_preserving_mtime(version_path, destination)?;
        info!("Version restored");
        Ok(RestoreReport {
            version_path: version_path.to_path_buf(),
            destination: destination.to_path_buf(),
            backup,
        })
    }

    /// Deletes a snapshot directory and its index entry.
    ///
    /// Refuses directories that are neither indexed nor hold a metadata
    /// record.
    #[instrument(skip(self), fields(version = %version_path.display()))]
    pub fn remove(&mut self, version_path: &Path) -> Result<RemoveReport> {
        let snapshot_dir = version_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| VtError::NotASnapshot {
                path: version_path.display().to_string(),
            })?;
        if !snapshot_dir.is_dir() {
            return Err(VtError::snapshot_not_found(version_path));
        }

        let version_path = canonical_version_path(version_path);
        let snapshot_dir = version_path
            .parent()
            .map_or_else(|| snapshot_dir.to_path_buf(), Path::to_path_buf);

        let snapshot = self
            .index
            .find_in_dir(&snapshot_dir)
            .cloned()
            .map(Snapshot::from);
        if snapshot.is_none() && !SnapshotLayout::is_snapshot_dir(&snapshot_dir) {
            return Err(VtError::NotASnapshot {
                path: version_path.display().to_string(),
            });
        }

        fs::remove_dir_all(&snapshot_dir)
            .io_context(|| format!("Failed to delete {}", snapshot_dir.display()))?;

        let target = snapshot_dir.clone();
        self.commit(move |index| {
            let removed = index.remove_in_dir(&target);
            debug!(removed, "Index entries dropped");
        })?;

        info!(dir = %snapshot_dir.display(), "Version removed");
        Ok(RemoveReport {
            version_path: snapshot
                .as_ref()
                .map_or(version_path, |s| s.version_path.clone()),
            snapshot_dir,
            snapshot,
        })
    }

    /// Reconciles the index with the default root and every known
    /// alternate root, persisting any additions.
    #[instrument(skip(self), fields(root = %self.root().display()))]
    pub fn reindex(&mut self) -> Result<&ScanReport> {
        let _lock = self.index_file.lock()?;
        let loaded = self.index_file.load()?;
        let corrupt = !loaded.quarantined.is_empty();
        self.quarantined.extend(loaded.quarantined);

        let mut index = loaded.index;
        let report = self.reconcile_roots(&mut index)?;
        if report.has_additions() || corrupt {
            self.index_file.persist(&index)?;
        }

        self.index = index;
        self.last_scan = report;
        Ok(&self.last_scan)
    }

    /// Saved versions are never written to: the destination may be neither
    /// the version itself nor anything inside a known storage root.
    fn check_restore_target(&self, version_path: &Path, destination: &Path) -> Result<()> {
        let destination = canonical_version_path(destination);
        let version_path = canonical_version_path(version_path);
        let in_store = std::iter::once(self.root())
            .chain(self.index.alternate_roots())
            .any(|root| destination.starts_with(root));

        if destination == version_path || in_store {
            return Err(VtError::ProtectedPath {
                path: destination.display().to_string(),
            });
        }
        Ok(())
    }

    /// lock, reload, mutate, persist.
    fn commit<F>(&mut self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Index),
    {
        let _lock = self.index_file.lock()?;
        let loaded = self.index_file.load()?;
        let mut index = loaded.index;

        if !loaded.quarantined.is_empty() {
            self.quarantined.extend(loaded.quarantined);
            self.last_scan = self.reconcile_roots(&mut index)?;
        }

        mutate(&mut index);
        self.index_file.persist(&index)?;
        self.index = index;
        Ok(())
    }

    fn reconcile_roots(&self, index: &mut Index) -> Result<ScanReport> {
        let roots: Vec<PathBuf> = std::iter::once(self.root().to_path_buf())
            .chain(index.alternate_roots().map(Path::to_path_buf))
            .collect();
        let report = reconcile(roots.iter().map(PathBuf::as_path), index)?;
        for missing in &report.missing_roots {
            warn!(root = %missing.display(), "Storage location unavailable, not scanned");
        }
        Ok(report)
    }
}

/// `<name><suffix>` next to `path`.
fn backup_path(path: &Path, suffix: &str) -> Result<PathBuf> {
    let mut name = path
        .file_name()
        .ok_or_else(|| VtError::PathUnavailable {
            path: path.display().to_string(),
            reason: "path has no file name".to_string(),
        })?
        .to_os_string();
    name.push(suffix);
    Ok(path.with_file_name(name))
}

/// Canonical form of a copied-file path, resolved through its directory so
/// the file itself need not exist.
fn canonical_version_path(version_path: &Path) -> PathBuf {
    match (version_path.parent(), version_path.file_name()) {
        (Some(dir), Some(name)) if !dir.as_os_str().is_empty() => dir
            .canonicalize()
            .map_or_else(|_| version_path.to_path_buf(), |dir| dir.join(name)),
        _ => version_path.to_path_buf(),
    }
}
