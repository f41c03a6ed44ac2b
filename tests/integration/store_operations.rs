//! Store operations against a temporary storage root.

use std::fs;

use crate::common::fixtures::{Workspace, saved, tree_listing};
use crate::common::init_test_logging;
use vt::error::VtError;
use vt::snapshot::{METADATA_FILE, SaveOutcome, SnapshotLayout};

#[test]
fn test_notes_scenario() {
    init_test_logging();
    let ws = Workspace::new();
    let notes = ws.write_file("notes.txt", [b'a'; 40]);
    let mut store = ws.store();

    let t1 = saved(store.save(&notes, "first", None).unwrap());
    assert_eq!(t1.file_size, 40);

    Workspace::append(&notes, [b'b'; 10]);
    let t2 = saved(store.save(&notes, "second", None).unwrap());
    assert_eq!(t2.file_size, 50);

    let listed = store.list(&notes);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].timestamp, t2.timestamp);
    assert_eq!(listed[0].file_size, 50);
    assert_eq!(listed[1].timestamp, t1.timestamp);
    assert_eq!(listed[1].file_size, 40);

    let report = store.restore(&t1.version_path, &notes).unwrap();
    assert_eq!(fs::metadata(&notes).unwrap().len(), 40);

    let backup = ws.work().join("notes.txt.backup");
    assert_eq!(report.backup.as_deref(), Some(backup.as_path()));
    assert_eq!(fs::metadata(&backup).unwrap().len(), 50);
}

#[test]
fn test_save_records_metadata() {
    let ws = Workspace::new();
    let report = ws.write_file("report.md", "# Q3\n");
    let mut store = ws.store();

    let snapshot = saved(store.save(&report, "before review", None).unwrap());

    let snapshot_dir = snapshot.version_path.parent().unwrap();
    assert!(snapshot_dir.join(METADATA_FILE).is_file());
    assert!(snapshot_dir.starts_with(store.root()));

    let metadata = SnapshotLayout::read_metadata(snapshot_dir).unwrap();
    assert_eq!(metadata.comment, "before review");
    assert_eq!(metadata.file_size, 5);
    assert_eq!(metadata.file_name.as_deref(), Some("report.md"));
    assert_eq!(metadata.file_id.as_ref(), Some(&snapshot.file_id));
    assert_eq!(
        metadata.original_path.as_deref(),
        Some(report.canonicalize().unwrap().as_path())
    );
    assert_eq!(ws.index_document_len(), 1);
}

#[test]
fn test_save_preserves_modification_time() {
    let ws = Workspace::new();
    let path = ws.write_file("old.txt", "old");
    let pinned = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&path, pinned).unwrap();

    let mut store = ws.store();
    let snapshot = saved(store.save(&path, "", None).unwrap());

    let copied = fs::metadata(&snapshot.version_path).unwrap();
    assert_eq!(filetime::FileTime::from_last_modification_time(&copied), pinned);
    assert_eq!(snapshot.file_modified.timestamp(), 1_600_000_000);
}

#[test]
fn test_save_missing_source() {
    let ws = Workspace::new();
    let mut store = ws.store();

    let err = store
        .save(&ws.work().join("ghost.txt"), "", None)
        .unwrap_err();
    assert!(matches!(err, VtError::SourceNotFound { .. }));
    assert!(err.is_user_recoverable());
    assert!(store.index().is_empty());
}

#[test]
fn test_save_directory_rejected() {
    let ws = Workspace::new();
    let mut store = ws.store();

    assert!(store.save(&ws.work(), "", None).is_err());
    assert!(store.index().is_empty());
}

#[test]
fn test_save_to_missing_location() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "a");
    let mut store = ws.store();

    let err = store
        .save(&path, "", Some(&ws.dir.path().join("no-such-drive")))
        .unwrap_err();
    assert!(matches!(err, VtError::StorageRootNotFound { .. }));
}

#[test]
fn test_cancelled_save_with_missing_source() {
    let ws = Workspace::new();
    let mut store = ws.store();

    let outcome = store
        .save(&ws.work().join("ghost.txt"), "", Some(std::path::Path::new("")))
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Cancelled);
    assert!(outcome.snapshot().is_none());
}

#[test]
fn test_restore_to_new_destination() {
    let ws = Workspace::new();
    let path = ws.write_file("draft.txt", "draft one");
    let mut store = ws.store();
    let snapshot = saved(store.save(&path, "", None).unwrap());

    let copy = ws.work().join("draft-copy.txt");
    let report = store.restore(&snapshot.version_path, &copy).unwrap();

    assert!(report.backup.is_none());
    assert_eq!(fs::read_to_string(&copy).unwrap(), "draft one");
    assert!(!ws.work().join("draft-copy.txt.backup").exists());
}

#[test]
fn test_restore_replaces_previous_backup() {
    let ws = Workspace::new();
    let path = ws.write_file("cfg.ini", "v1");
    let mut store = ws.store();
    let v1 = saved(store.save(&path, "", None).unwrap());

    fs::write(&path, "v2").unwrap();
    store.restore(&v1.version_path, &path).unwrap();
    fs::write(&path, "v3").unwrap();
    store.restore(&v1.version_path, &path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "v1");
    assert_eq!(
        fs::read_to_string(ws.work().join("cfg.ini.backup")).unwrap(),
        "v3"
    );
}

#[test]
fn test_restore_missing_version() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "a");
    let store = ws.store();

    let err = store
        .restore(&ws.root().join("nope").join("a.txt"), &path)
        .unwrap_err();
    assert!(matches!(err, VtError::SnapshotNotFound { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a");
}

#[test]
fn test_remove_deletes_directory() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "a");
    let mut store = ws.store();
    let snapshot = saved(store.save(&path, "", None).unwrap());
    let snapshot_dir = snapshot.version_path.parent().unwrap().to_path_buf();

    let report = store.remove(&snapshot.version_path).unwrap();

    assert_eq!(report.snapshot_dir, snapshot_dir);
    assert!(report.snapshot.is_some());
    assert!(!snapshot_dir.exists());
    assert_eq!(ws.index_document_len(), 0);
}

#[test]
fn test_remove_refuses_plain_directory() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "a");
    let mut store = ws.store();
    let before = tree_listing(&ws.work());

    let err = store.remove(&path).unwrap_err();

    assert!(matches!(err, VtError::NotASnapshot { .. }));
    assert_eq!(tree_listing(&ws.work()), before);
}

#[test]
fn test_name_identity_survives_replacement() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "one");
    let mut store = ws.name_store();
    saved(store.save(&path, "", None).unwrap());

    // A new file object under the same name.
    fs::remove_file(&path).unwrap();
    fs::write(&path, "two").unwrap();
    saved(store.save(&path, "", None).unwrap());

    assert_eq!(store.list(&path).len(), 2);
}

#[cfg(unix)]
#[test]
fn test_inode_identity_follows_rename() {
    let ws = Workspace::new();
    let path = ws.write_file("before.txt", "x");
    let mut store = ws.store();
    saved(store.save(&path, "", None).unwrap());

    let renamed = ws.work().join("after.txt");
    fs::rename(&path, &renamed).unwrap();

    let listed = store.list(&renamed);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, "before.txt");
    assert!(store.list(&ws.work().join("unrelated.txt")).is_empty());
}

#[test]
fn test_restore_onto_itself_refused() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "precious");
    let mut store = ws.store();
    let snapshot = saved(store.save(&path, "", None).unwrap());
    let snapshot_dir = snapshot.version_path.parent().unwrap().to_path_buf();
    let before = tree_listing(&snapshot_dir);

    let err = store
        .restore(&snapshot.version_path, &snapshot.version_path)
        .unwrap_err();

    assert!(matches!(err, VtError::ProtectedPath { .. }));
    assert_eq!(fs::read_to_string(&snapshot.version_path).unwrap(), "precious");
    assert_eq!(tree_listing(&snapshot_dir), before);
}

#[test]
fn test_restore_into_storage_roots_refused() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "a");
    let drive = ws.drive("usb");
    let mut store = ws.store();
    let local = saved(store.save(&path, "", None).unwrap());
    let remote = saved(store.save(&path, "", Some(&drive)).unwrap());

    let into_default = store.restore(&local.version_path, &local.metadata_path);
    assert!(matches!(into_default, Err(VtError::ProtectedPath { .. })));

    let into_alternate = store.restore(&local.version_path, &remote.version_path);
    assert!(matches!(into_alternate, Err(VtError::ProtectedPath { .. })));
    assert_eq!(fs::read_to_string(&remote.version_path).unwrap(), "a");
    assert!(SnapshotLayout::read_metadata(local.version_path.parent().unwrap()).is_ok());
}

#[test]
fn test_remove_by_metadata_path_drops_entry() {
    let ws = Workspace::new();
    let path = ws.write_file("a.txt", "a");
    let mut store = ws.store();
    let snapshot = saved(store.save(&path, "", None).unwrap());
    let snapshot_dir = snapshot.version_path.parent().unwrap().to_path_buf();

    let report = store.remove(&snapshot.metadata_path).unwrap();

    assert_eq!(report.version_path, snapshot.version_path);
    assert!(report.snapshot.is_some());
    assert!(!snapshot_dir.exists());
    assert_eq!(ws.index_document_len(), 0);
    assert!(store.list(&path).is_empty());
}
