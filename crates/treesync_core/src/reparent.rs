//! Drag-and-drop reparenting.
//!
//! [`plan_move`] validates a drop against the current tree snapshot without any
//! I/O; [`WorkspaceTree::move_entry`] executes the plan: one rename on the
//! filesystem collaborator, then a reload of the former parent (when it
//! differs from the target) and of the target.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use ts_rs::TS;

use crate::error::{Result, TreeSyncError};
use crate::fs::{AsyncFileSystem, TreeEvent};
use crate::tree::TreeStore;
use crate::workspace::WorkspaceTree;

/// Why a drop was accepted as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum IgnoredReason {
    /// Dropped onto itself.
    SameEntry,
    /// Dropped onto a file.
    TargetNotDirectory,
    /// The target is already the entry's parent.
    AlreadyInTarget,
}

/// Result of a drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "status")]
pub enum MoveOutcome {
    Moved { from: PathBuf, to: PathBuf },
    Ignored { reason: IgnoredReason },
}

/// A validated move, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub dragged: PathBuf,
    pub target: PathBuf,
    pub destination: PathBuf,
    pub former_parent: PathBuf,
    pub is_dir: bool,
}

/// What to do with a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveDecision {
    Execute(MovePlan),
    Ignore(IgnoredReason),
}

/// Validate dropping `dragged` onto `target`.
///
/// Both paths must be known to `store`. Dropping onto itself, onto a file, or
/// onto its current parent is ignored; dropping a directory into itself or
/// one of its descendants is an [`TreeSyncError::InvalidMove`].
///
/// A drop onto the current parent is treated as a no-op rather than a move
/// attempt: the destination would be the source path itself, so no rename is
/// issued and no directory is reloaded.
pub fn plan_move(store: &TreeStore, dragged: &Path, target: &Path) -> Result<MoveDecision> {
    if dragged == target {
        return Ok(MoveDecision::Ignore(IgnoredReason::SameEntry));
    }

    let dragged_entry = store
        .get(dragged)
        .ok_or_else(|| TreeSyncError::NotFound(dragged.to_path_buf()))?;
    let target_is_dir = store
        .is_dir(target)
        .ok_or_else(|| TreeSyncError::NotFound(target.to_path_buf()))?;

    if !target_is_dir {
        return Ok(MoveDecision::Ignore(IgnoredReason::TargetNotDirectory));
    }

    // Component-wise prefix test, so `/ws/bb` is not inside `/ws/b`
    if target.starts_with(dragged) {
        return Err(TreeSyncError::InvalidMove {
            dragged: dragged.to_path_buf(),
            target: target.to_path_buf(),
        });
    }

    let former_parent = dragged
        .parent()
        .ok_or_else(|| TreeSyncError::NotFound(dragged.to_path_buf()))?
        .to_path_buf();
    if former_parent == target {
        return Ok(MoveDecision::Ignore(IgnoredReason::AlreadyInTarget));
    }

    Ok(MoveDecision::Execute(MovePlan {
        dragged: dragged.to_path_buf(),
        target: target.to_path_buf(),
        destination: target.join(&dragged_entry.name),
        former_parent,
        is_dir: dragged_entry.is_dir,
    }))
}

impl<FS: AsyncFileSystem> WorkspaceTree<FS> {
    /// Move `dragged` into the directory `target`.
    ///
    /// If the rename fails the tree is left as it was. Failures reloading the
    /// affected directories afterwards are reported as notices; the next
    /// watcher tick repairs them.
    pub async fn move_entry(&self, dragged: &Path, target: &Path) -> Result<MoveOutcome> {
        let result = self.move_quiet(dragged, target).await;
        self.surface("Move", result)
    }

    async fn move_quiet(&self, dragged: &Path, target: &Path) -> Result<MoveOutcome> {
        let decision = plan_move(&self.read_state().store, dragged, target)?;
        let plan = match decision {
            MoveDecision::Execute(plan) => plan,
            MoveDecision::Ignore(reason) => {
                debug!("Ignoring drop of {:?} onto {:?}: {:?}", dragged, target, reason);
                return Ok(MoveOutcome::Ignored { reason });
            }
        };

        self.fs()
            .move_file(&plan.dragged, &plan.destination)
            .await
            .map_err(|source| TreeSyncError::Move {
                from: plan.dragged.clone(),
                to: plan.destination.clone(),
                source,
            })?;
        info!("Moved {:?} to {:?}", plan.dragged, plan.destination);

        if plan.is_dir {
            self.write_state()
                .session
                .rekey(&plan.dragged, &plan.destination);
        }

        if plan.former_parent != plan.target {
            self.refresh_after_change(&plan.former_parent).await;
        }
        self.refresh_after_change(&plan.target).await;

        self.emit(TreeEvent::EntryMoved {
            from: plan.dragged.clone(),
            to: plan.destination.clone(),
        });
        self.persist_session().await;

        Ok(MoveOutcome::Moved {
            from: plan.dragged,
            to: plan.destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::entry::Entry;
    use crate::error::ErrorKind;
    use crate::fs::{FileSystem, SyncToAsyncFs, block_on_test};
    use crate::session::WorkspaceSession;
    use crate::test_utils::{FsCall, FsOp, RecordingFs};
    use std::sync::Arc;

    fn store() -> TreeStore {
        let mut store = TreeStore::new("/ws");
        store.set_root_children(vec![
            Entry::dir("/ws/b"),
            Entry::dir("/ws/bb"),
            Entry::file("/ws/a.txt"),
        ]);
        store.patch_children(
            Path::new("/ws/b"),
            vec![Entry::dir("/ws/b/sub"), Entry::file("/ws/b/c.txt")],
        );
        store.patch_children(Path::new("/ws/b/sub"), vec![Entry::dir("/ws/b/sub/deep")]);
        store
    }

    #[test]
    fn test_plan_rejects_self_and_descendants() {
        let store = store();
        for target in ["/ws/b/sub", "/ws/b/sub/deep"] {
            let err = plan_move(&store, Path::new("/ws/b"), Path::new(target)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidMove, "target {}", target);
        }
        assert_eq!(
            plan_move(&store, Path::new("/ws/b"), Path::new("/ws/b")).unwrap(),
            MoveDecision::Ignore(IgnoredReason::SameEntry)
        );
    }

    #[test]
    fn test_plan_accepts_other_directories() {
        let store = store();
        // Shares a name prefix but is not a descendant
        let decision = plan_move(&store, Path::new("/ws/b"), Path::new("/ws/bb")).unwrap();
        assert_eq!(
            decision,
            MoveDecision::Execute(MovePlan {
                dragged: PathBuf::from("/ws/b"),
                target: PathBuf::from("/ws/bb"),
                destination: PathBuf::from("/ws/bb/b"),
                former_parent: PathBuf::from("/ws"),
                is_dir: true,
            })
        );

        let decision =
            plan_move(&store, Path::new("/ws/b/sub/deep"), Path::new("/ws")).unwrap();
        assert!(matches!(decision, MoveDecision::Execute(_)));
    }

    #[test]
    fn test_plan_ignores_inert_drops() {
        let store = store();
        assert_eq!(
            plan_move(&store, Path::new("/ws/b"), Path::new("/ws/a.txt")).unwrap(),
            MoveDecision::Ignore(IgnoredReason::TargetNotDirectory)
        );
        assert_eq!(
            plan_move(&store, Path::new("/ws/b/c.txt"), Path::new("/ws/b")).unwrap(),
            MoveDecision::Ignore(IgnoredReason::AlreadyInTarget)
        );
    }

    #[test]
    fn test_plan_unknown_paths() {
        let store = store();
        let err = plan_move(&store, Path::new("/ws/ghost"), Path::new("/ws/b")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = plan_move(&store, Path::new("/ws/a.txt"), Path::new("/ws/ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    fn setup(paths: &[&str]) -> (RecordingFs, WorkspaceTree<SyncToAsyncFs<RecordingFs>>) {
        let fs = RecordingFs::with_files(paths);
        let tree = WorkspaceTree::new(
            SyncToAsyncFs::new(fs.clone()),
            WorkspaceSession::new("/ws"),
            &EngineConfig::default(),
        );
        block_on_test(tree.load_root()).unwrap();
        (fs, tree)
    }

    #[test]
    fn test_move_renames_then_reloads_both_branches() {
        let (fs, tree) = setup(&["/ws/a.txt", "/ws/b/c.txt"]);
        fs.clear_calls();

        let outcome = block_on_test(tree.move_entry(Path::new("/ws/a.txt"), Path::new("/ws/b")))
            .unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: PathBuf::from("/ws/a.txt"),
                to: PathBuf::from("/ws/b/a.txt"),
            }
        );

        let calls = fs.calls();
        assert_eq!(
            calls[0],
            FsCall::Move(PathBuf::from("/ws/a.txt"), PathBuf::from("/ws/b/a.txt"))
        );
        assert_eq!(
            fs.listed(),
            vec![PathBuf::from("/ws"), PathBuf::from("/ws/b")]
        );
        assert!(tree.find(Path::new("/ws/a.txt")).is_none());
        assert_eq!(
            tree.find(Path::new("/ws/b")).unwrap().child_names(),
            vec!["a.txt", "c.txt"]
        );
    }

    #[test]
    fn test_move_directory_rekeys_expansion() {
        let (_fs, tree) = setup(&["/ws/b/sub/x.txt", "/ws/t/keep.txt"]);
        block_on_test(tree.expand(Path::new("/ws/b"))).unwrap();
        block_on_test(tree.expand(Path::new("/ws/b/sub"))).unwrap();
        block_on_test(tree.expand(Path::new("/ws/t"))).unwrap();

        block_on_test(tree.move_entry(Path::new("/ws/b"), Path::new("/ws/t"))).unwrap();

        assert!(tree.is_expanded(Path::new("/ws/t/b/sub")));
        assert!(tree.find(Path::new("/ws/t/b/sub/x.txt")).is_some());
        assert!(tree.find(Path::new("/ws/b")).is_none());
    }

    #[test]
    fn test_cycle_rejected_before_io() {
        let (fs, tree) = setup(&["/ws/b/sub/x.txt"]);
        block_on_test(tree.expand(Path::new("/ws/b"))).unwrap();
        let before = tree.tree();
        fs.clear_calls();

        let err = block_on_test(tree.move_entry(Path::new("/ws/b"), Path::new("/ws/b/sub")))
            .unwrap_err();
        assert!(matches!(err, TreeSyncError::InvalidMove { .. }));
        assert!(fs.calls().is_empty());
        assert!(Arc::ptr_eq(&before, &tree.tree()));
    }

    #[test]
    fn test_failed_rename_leaves_tree_unchanged() {
        let (fs, tree) = setup(&["/ws/a.txt", "/ws/b/a.txt"]);
        let before = tree.tree();
        fs.clear_calls();

        // Name collision at the destination
        let err = block_on_test(tree.move_entry(Path::new("/ws/a.txt"), Path::new("/ws/b")))
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::AlreadyExists));
        assert!(fs.listed().is_empty());
        assert!(Arc::ptr_eq(&before, &tree.tree()));

        assert!(fs.inner().exists(Path::new("/ws/a.txt")));
    }

    #[test]
    fn test_permission_denied_is_surfaced() {
        let (fs, tree) = setup(&["/ws/a.txt", "/ws/b/c.txt"]);
        let notices = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&notices);
        tree.events().subscribe(Arc::new(move |event: &TreeEvent| {
            if event.is_error_notice() {
                sink.lock().unwrap().push(event.clone());
            }
        }));
        fs.fail(FsOp::Move, "/ws/a.txt");

        let err = block_on_test(tree.move_entry(Path::new("/ws/a.txt"), Path::new("/ws/b")))
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::PermissionDenied));
        assert_eq!(notices.lock().unwrap().len(), 1);
        assert!(tree.find(Path::new("/ws/a.txt")).is_some());
    }

    #[test]
    fn test_drop_onto_file_is_silent() {
        let (fs, tree) = setup(&["/ws/a.txt", "/ws/z.txt"]);
        fs.clear_calls();
        let outcome =
            block_on_test(tree.move_entry(Path::new("/ws/a.txt"), Path::new("/ws/z.txt"))).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Ignored {
                reason: IgnoredReason::TargetNotDirectory
            }
        );
        assert!(fs.calls().is_empty());
    }
}
