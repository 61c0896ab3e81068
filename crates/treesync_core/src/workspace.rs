//! Workspace tree facade.
//!
//! [`WorkspaceTree`] ties the [`TreeStore`], the [`DirectoryLoader`], the
//! [`WorkspaceSession`] and the filesystem collaborator together and exposes
//! the operations a file explorer needs: load, expand/collapse, reveal,
//! create/rename/delete, quick-open search, and drag-and-drop moves (see
//! [`crate::reparent`]).
//!
//! A `WorkspaceTree` is a cheap handle; clones share the same tree. State is
//! only locked for the duration of a patch and never across a filesystem
//! call, so a watcher tick and a user operation may interleave freely. Every
//! mutation replaces a whole branch, so a late response for a directory
//! simply overwrites an earlier one.
//!
//! # Example
//!
//! ```ignore
//! use treesync_core::config::EngineConfig;
//! use treesync_core::fs::{RealFileSystem, SyncToAsyncFs};
//! use treesync_core::session::WorkspaceSession;
//! use treesync_core::workspace::WorkspaceTree;
//!
//! let tree = WorkspaceTree::new(
//!     SyncToAsyncFs::new(RealFileSystem),
//!     WorkspaceSession::new("/home/user/notes"),
//!     &EngineConfig::default(),
//! );
//! let root = tree.load_root().await?;
//! tree.expand(Path::new("/home/user/notes/drafts")).await?;
//! ```

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::entry::Entry;
use crate::error::{Result, TreeSyncError};
use crate::fs::{AsyncFileSystem, CallbackRegistry, TreeEvent};
use crate::search::{FileMatch, filter_files, flatten_files};
use crate::session::{SessionStore, WorkspaceSession};
use crate::tree::{DirectoryLoader, TreeStore};

pub(crate) struct TreeState {
    pub(crate) store: TreeStore,
    pub(crate) session: WorkspaceSession,
}

/// Mirrored workspace tree for one root.
pub struct WorkspaceTree<FS> {
    fs: Arc<FS>,
    loader: DirectoryLoader,
    state: Arc<RwLock<TreeState>>,
    events: Arc<CallbackRegistry>,
    sessions: Option<Arc<dyn SessionStore>>,
}

impl<FS> Clone for WorkspaceTree<FS> {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            loader: self.loader,
            state: Arc::clone(&self.state),
            events: Arc::clone(&self.events),
            sessions: self.sessions.clone(),
        }
    }
}

impl<FS: AsyncFileSystem> WorkspaceTree<FS> {
    /// Create a tree for `session.root`. Nothing is loaded until
    /// [`load_root`](Self::load_root) is called.
    pub fn new(fs: FS, session: WorkspaceSession, config: &EngineConfig) -> Self {
        let store = TreeStore::new(session.root.clone());
        Self {
            fs: Arc::new(fs),
            loader: DirectoryLoader::new(config),
            state: Arc::new(RwLock::new(TreeState { store, session })),
            events: Arc::new(CallbackRegistry::new()),
            sessions: None,
        }
    }

    /// Share an existing event registry (builder pattern).
    pub fn with_events(mut self, events: Arc<CallbackRegistry>) -> Self {
        self.events = events;
        self
    }

    /// Persist the session through `store` after every change to it (builder pattern).
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    pub fn fs(&self) -> &FS {
        &self.fs
    }

    /// Registry that receives every [`TreeEvent`] this tree emits.
    pub fn events(&self) -> &Arc<CallbackRegistry> {
        &self.events
    }

    pub fn root(&self) -> PathBuf {
        self.read_state().store.root().to_path_buf()
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> WorkspaceSession {
        self.read_state().session.clone()
    }

    /// Snapshot of the whole tree.
    pub fn tree(&self) -> Arc<Entry> {
        self.read_state().store.tree()
    }

    /// Snapshot of the subtree at `path`.
    pub fn find(&self, path: &Path) -> Option<Arc<Entry>> {
        self.read_state().store.get(path)
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.read_state().session.is_expanded(path)
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, TreeState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn emit(&self, event: TreeEvent) {
        self.events.emit(&event);
    }

    /// Log and notify a failed user-facing operation, then hand the result back.
    pub(crate) fn surface<T>(&self, action: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!("{} failed: {}", action, err);
            self.emit(TreeEvent::error(format!("{} failed: {}", action, err)));
        }
        result
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// List one directory without touching the tree.
    pub async fn list(&self, path: &Path) -> Result<Vec<Entry>> {
        self.loader.list(&*self.fs, path).await
    }

    /// Load (or reload) the root and every expanded directory below it.
    pub async fn load_root(&self) -> Result<Arc<Entry>> {
        let root = self.root();
        let result = self.reload_quiet(&root).await;
        self.surface("Load workspace", result)?;
        Ok(self.tree())
    }

    /// Re-list `path`, patch it into the tree, then re-list its expanded
    /// descendants. If `path` itself cannot be listed the tree is left untouched.
    pub async fn reload_dir(&self, path: &Path) -> Result<()> {
        let result = self.reload_quiet(path).await;
        self.surface("Reload folder", result)
    }

    pub(crate) async fn reload_quiet(&self, path: &Path) -> Result<()> {
        let entries = self.list(path).await?;
        self.apply_listing(path, entries).await;
        Ok(())
    }

    /// Patch an already fetched listing of `dir` into the tree and re-list its
    /// expanded descendants, shallowest first.
    pub async fn apply_listing(&self, dir: &Path, entries: Vec<Entry>) {
        if !self.patch(dir, entries) {
            return;
        }

        let mut queue: VecDeque<PathBuf> = self.expanded_children(dir).into();
        while let Some(next) = queue.pop_front() {
            match self.list(&next).await {
                Ok(entries) => {
                    if self.patch(&next, entries) {
                        queue.extend(self.expanded_children(&next));
                    }
                }
                Err(err) => {
                    warn!("Failed to reload expanded folder {:?}: {}", next, err);
                    self.emit(TreeEvent::error(format!("Reload folder failed: {}", err)));
                }
            }
        }
    }

    /// Reload after a successful mutation; a failure here is reported, not returned.
    pub(crate) async fn refresh_after_change(&self, dir: &Path) {
        if let Err(err) = self.reload_quiet(dir).await {
            warn!("Failed to refresh {:?}: {}", dir, err);
            self.emit(TreeEvent::error(format!("Refresh failed: {}", err)));
        }
    }

    fn patch(&self, dir: &Path, entries: Vec<Entry>) -> bool {
        let patched = self.write_state().store.patch_children(dir, entries);
        if patched {
            self.emit(TreeEvent::BranchReloaded {
                path: dir.to_path_buf(),
            });
        }
        patched
    }

    fn expanded_children(&self, dir: &Path) -> Vec<PathBuf> {
        let state = self.read_state();
        state
            .store
            .child_paths(dir)
            .unwrap_or_default()
            .iter()
            .filter(|p| state.store.is_dir(p) == Some(true) && state.session.is_expanded(p))
            .cloned()
            .collect()
    }

    // ========================================================================
    // Expansion
    // ========================================================================

    /// Expand a directory, loading it if its children are unloaded.
    ///
    /// Expanding a file is a no-op. If the load fails the directory stays collapsed.
    pub async fn expand(&self, path: &Path) -> Result<()> {
        let result = self.expand_quiet(path).await;
        self.surface("Expand folder", result)
    }

    async fn expand_quiet(&self, path: &Path) -> Result<()> {
        let needs_load = {
            let mut state = self.write_state();
            match state.store.is_dir(path) {
                None => return Err(TreeSyncError::NotFound(path.to_path_buf())),
                Some(false) => return Ok(()),
                Some(true) => {}
            }
            state.session.expand(path);
            !state.store.is_loaded(path)
        };

        if needs_load && let Err(err) = self.reload_quiet(path).await {
            self.write_state().session.collapse(path);
            return Err(err);
        }

        self.persist_session().await;
        Ok(())
    }

    /// Collapse a directory. Its loaded children are kept.
    pub async fn collapse(&self, path: &Path) -> bool {
        let changed = self.write_state().session.collapse(path);
        if changed {
            self.persist_session().await;
        }
        changed
    }

    /// Flip the expansion state; returns the new state.
    pub async fn toggle(&self, path: &Path) -> Result<bool> {
        if self.is_expanded(path) {
            self.collapse(path).await;
            Ok(false)
        } else {
            self.expand(path).await?;
            Ok(self.is_expanded(path))
        }
    }

    /// Load and expand every ancestor of `path` so that it resolves in the tree.
    pub async fn reveal(&self, path: &Path) -> Result<Arc<Entry>> {
        let result = self.reveal_quiet(path).await;
        self.surface("Reveal", result)
    }

    async fn reveal_quiet(&self, path: &Path) -> Result<Arc<Entry>> {
        let root = self.root();
        if !path.starts_with(&root) {
            return Err(TreeSyncError::NotFound(path.to_path_buf()));
        }

        let mut ancestors: Vec<PathBuf> = path
            .ancestors()
            .skip(1)
            .take_while(|a| a.starts_with(&root))
            .map(Path::to_path_buf)
            .collect();
        ancestors.reverse();

        for dir in ancestors {
            let loaded = {
                let mut state = self.write_state();
                if state.store.is_dir(&dir) != Some(true) {
                    return Err(TreeSyncError::NotFound(path.to_path_buf()));
                }
                state.session.expand(&dir);
                state.store.is_loaded(&dir)
            };
            if !loaded {
                self.reload_quiet(&dir).await?;
            }
        }

        self.persist_session().await;
        self.find(path)
            .ok_or_else(|| TreeSyncError::NotFound(path.to_path_buf()))
    }

    // ========================================================================
    // File operations
    // ========================================================================

    /// Create an empty file named `name` in `parent`.
    pub async fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let result = self.create_entry(parent, name, false).await;
        self.surface("Create file", result)
    }

    /// Create a directory named `name` in `parent`.
    pub async fn create_folder(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let result = self.create_entry(parent, name, true).await;
        self.surface("Create folder", result)
    }

    async fn create_entry(&self, parent: &Path, name: &str, is_dir: bool) -> Result<PathBuf> {
        validate_name(name)?;
        if self.read_state().store.is_dir(parent) != Some(true) {
            return Err(TreeSyncError::NotFound(parent.to_path_buf()));
        }

        let path = parent.join(name);
        let created = if is_dir {
            if self.fs.exists(&path).await {
                Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{:?} already exists", path),
                ))
            } else {
                self.fs.create_dir_all(&path).await
            }
        } else {
            self.fs.create_new(&path, "").await
        };
        created.map_err(|source| TreeSyncError::Create {
            path: path.clone(),
            source,
        })?;

        info!("Created {:?}", path);
        self.emit(TreeEvent::EntryCreated {
            path: path.clone(),
            is_dir,
        });
        self.refresh_after_change(parent).await;
        Ok(path)
    }

    /// Rename an entry within its directory; returns the new path.
    pub async fn rename(&self, path: &Path, new_name: &str) -> Result<PathBuf> {
        let result = self.rename_quiet(path, new_name).await;
        self.surface("Rename", result)
    }

    async fn rename_quiet(&self, path: &Path, new_name: &str) -> Result<PathBuf> {
        validate_name(new_name)?;
        let (is_dir, parent) = self.locate_child(path)?;

        let new_path = parent.join(new_name);
        if new_path == path {
            return Ok(new_path);
        }

        self.fs
            .move_file(path, &new_path)
            .await
            .map_err(|source| TreeSyncError::Move {
                from: path.to_path_buf(),
                to: new_path.clone(),
                source,
            })?;

        info!("Renamed {:?} to {:?}", path, new_path);
        if is_dir {
            self.write_state().session.rekey(path, &new_path);
        }
        self.emit(TreeEvent::EntryRenamed {
            old_path: path.to_path_buf(),
            new_path: new_path.clone(),
        });
        self.refresh_after_change(&parent).await;
        self.persist_session().await;
        Ok(new_path)
    }

    /// Delete a file, or a directory with everything below it.
    pub async fn delete(&self, path: &Path) -> Result<()> {
        let result = self.delete_quiet(path).await;
        self.surface("Delete", result)
    }

    async fn delete_quiet(&self, path: &Path) -> Result<()> {
        let (is_dir, parent) = self.locate_child(path)?;

        let removed = if is_dir {
            self.fs.remove_dir_all(path).await
        } else {
            self.fs.delete_file(path).await
        };
        removed.map_err(|source| TreeSyncError::Delete {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Deleted {:?}", path);
        self.write_state().session.forget(path);
        self.emit(TreeEvent::EntryDeleted {
            path: path.to_path_buf(),
        });
        self.refresh_after_change(&parent).await;
        self.persist_session().await;
        Ok(())
    }

    /// `(is_dir, parent)` of a known, non-root entry.
    fn locate_child(&self, path: &Path) -> Result<(bool, PathBuf)> {
        let state = self.read_state();
        if path == state.store.root() {
            return Err(TreeSyncError::ProtectedRoot(path.to_path_buf()));
        }
        let is_dir = state
            .store
            .is_dir(path)
            .ok_or_else(|| TreeSyncError::NotFound(path.to_path_buf()))?;
        let parent = path
            .parent()
            .ok_or_else(|| TreeSyncError::NotFound(path.to_path_buf()))?;
        Ok((is_dir, parent.to_path_buf()))
    }

    /// Read a leaf file's content.
    pub async fn read_file(&self, path: &Path) -> Result<String> {
        let result = self
            .fs
            .read_to_string(path)
            .await
            .map_err(|source| TreeSyncError::FileRead {
                path: path.to_path_buf(),
                source,
            });
        self.surface("Open file", result)
    }

    /// Overwrite a leaf file's content.
    pub async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let result = self
            .fs
            .write_file(path, content)
            .await
            .map_err(|source| TreeSyncError::FileWrite {
                path: path.to_path_buf(),
                source,
            });
        self.surface("Save file", result)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Every loaded file, depth-first in display order.
    pub fn files(&self) -> Vec<FileMatch> {
        flatten_files(&self.tree())
    }

    /// Loaded files whose name contains `query` as a case-insensitive subsequence.
    pub fn search(&self, query: &str) -> Vec<FileMatch> {
        filter_files(&self.files(), query)
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub(crate) async fn persist_session(&self) {
        let Some(store) = &self.sessions else {
            return;
        };
        let session = self.session();
        match store.save(&session).await {
            Ok(()) => debug!("Saved session for {:?}", session.root),
            Err(err) => warn!("Failed to save session: {}", err),
        }
    }
}

/// A single path segment that is neither empty nor `.`/`..`.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(TreeSyncError::InvalidName(name.to_string()));
    }
    Ok(())
}
