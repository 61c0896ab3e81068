//! The engine against the real filesystem.

mod common;

use std::path::Path;

use common::block_on;
use treesync_core::config::EngineConfig;
use treesync_core::fs::{RealFileSystem, SyncToAsyncFs};
use treesync_core::session::{FsSessionStore, SessionStore, WorkspaceSession};
use treesync_core::workspace::WorkspaceTree;
use treesync_core::{MoveOutcome, TickOutcome};

fn tree_at(root: &Path) -> WorkspaceTree<SyncToAsyncFs<RealFileSystem>> {
    WorkspaceTree::new(
        SyncToAsyncFs::new(RealFileSystem),
        WorkspaceSession::new(root),
        &EngineConfig::default(),
    )
}

#[test]
fn test_explorer_operations_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    std::fs::write(root.join("readme.md"), "# hi").unwrap();
    std::fs::create_dir(root.join(".hidden")).unwrap();

    let tree = tree_at(&root);
    let loaded = block_on(tree.load_root()).unwrap();
    assert_eq!(loaded.child_names(), vec!["readme.md"]);

    let notes = block_on(tree.create_folder(&root, "notes")).unwrap();
    let draft = block_on(tree.create_file(&notes, "draft.md")).unwrap();
    assert!(draft.is_file());
    block_on(tree.write_file(&draft, "body")).unwrap();
    assert_eq!(block_on(tree.read_file(&draft)).unwrap(), "body");

    let outcome = block_on(tree.move_entry(&root.join("readme.md"), &notes)).unwrap();
    assert!(matches!(outcome, MoveOutcome::Moved { .. }));
    assert!(root.join("notes/readme.md").is_file());

    let renamed = block_on(tree.rename(&notes, "journal")).unwrap();
    assert!(renamed.is_dir());
    assert!(tree.find(&renamed).is_some());
    assert!(tree.find(&notes).is_none());

    block_on(tree.delete(&renamed)).unwrap();
    assert!(!renamed.exists());
    assert_eq!(tree.tree().children.as_ref().map(Vec::len), Some(0));
}

#[test]
fn test_repository_detection() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("project/.git")).unwrap();
    std::fs::create_dir(root.join("plain")).unwrap();

    let tree = tree_at(root);
    let loaded = block_on(tree.load_root()).unwrap();
    assert_eq!(
        loaded.child("project").unwrap().is_version_controlled,
        Some(true)
    );
    assert_eq!(
        loaded.child("plain").unwrap().is_version_controlled,
        Some(false)
    );
}

#[test]
fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("ws");
    std::fs::create_dir_all(root.join("a/b")).unwrap();
    let session_path = dir.path().join("session.json");

    let store = std::sync::Arc::new(FsSessionStore::new(
        SyncToAsyncFs::new(RealFileSystem),
        session_path.clone(),
    ));
    let tree = tree_at(&root).with_session_store(store.clone());
    block_on(tree.load_root()).unwrap();
    block_on(tree.reveal(&root.join("a/b"))).unwrap();

    let saved = block_on(store.load()).unwrap().unwrap();
    let resumed = WorkspaceSession::resume(Some(saved), &root);
    assert!(resumed.is_expanded(&root.join("a")));

    let tree = WorkspaceTree::new(
        SyncToAsyncFs::new(RealFileSystem),
        resumed,
        &EngineConfig::default(),
    );
    block_on(tree.load_root()).unwrap();
    assert!(tree.find(&root.join("a/b")).is_some());
}

#[test]
fn test_watcher_sees_external_change() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    std::fs::write(root.join("a.txt"), "").unwrap();

    let mut watcher =
        treesync_core::ChangeWatcher::new(tree_at(&root), &EngineConfig::default());
    assert!(matches!(block_on(watcher.tick()), TickOutcome::Changed { .. }));
    assert_eq!(block_on(watcher.tick()), TickOutcome::Unchanged);

    std::fs::write(root.join("b.txt"), "").unwrap();
    assert!(matches!(block_on(watcher.tick()), TickOutcome::Changed { .. }));
    assert!(watcher.tree().find(&root.join("b.txt")).is_some());
}
