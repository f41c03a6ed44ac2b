//! File version storage.
//!
//! Each saved version is a full copy of the file plus a metadata record,
//! grouped by the file's identity under a storage root. The default root
//! also holds the index of every known version.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.versiontracker/
//! ├── index.json                     # flattened index (default root only)
//! ├── roots.json                     # alternate roots ever used
//! ├── index.lock                     # advisory lock for index updates
//! └── 2049-1183044/                  # file identity
//!     ├── 2026-10-16T09-30-00/
//!     │   ├── notes.txt              # copied bytes
//!     │   └── metadata.json
//!     └── 2026-10-16T09-30-00-1/     # second save within the same second
//!         ├── notes.txt
//!         └── metadata.json
//!
//! /media/usb/.versiontracker/        # alternate root, same shape, no index
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vt::snapshot::{SaveOutcome, StoreOptions, VersionStore};
//!
//! let mut store = VersionStore::open(StoreOptions::new(root))?;
//!
//! if let SaveOutcome::Saved(snapshot) = store.save(path, "before rewrite", None)? {
//!     println!("{}", snapshot.version_path.display());
//! }
//!
//! for snapshot in store.list(path) {
//!     println!("{} {}", snapshot.timestamp, snapshot.comment);
//! }
//! ```

mod index;
mod layout;
mod scanner;
mod schema;
mod store;

pub use index::{INDEX_FILE, Index, IndexFile, LOCK_FILE, LoadedIndex, Quarantine, ROOTS_FILE};
pub use layout::{METADATA_FILE, STORE_DIR_NAME, SnapshotLayout, copy_preserving_mtime};
pub use scanner::{ScanReport, SkippedDir, reconcile, reconcile_root};
pub use schema::{IndexEntry, STAMP_FORMAT, Snapshot, SnapshotMetadata, SnapshotStamp};
pub use store::{RemoveReport, RestoreReport, SaveOutcome, StoreOptions, VersionStore};
