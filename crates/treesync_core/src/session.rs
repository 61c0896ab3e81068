//! Per-root UI session state: which root is open and which directories are expanded.
//!
//! The engine holds no ambient state of its own. A [`WorkspaceSession`] is handed
//! to the [`WorkspaceTree`](crate::workspace::WorkspaceTree) at construction and
//! persisted through a [`SessionStore`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{Result, TreeSyncError};
use crate::fs::{AsyncFileSystem, BoxFuture};

/// Open root plus its expanded directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorkspaceSession {
    pub root: PathBuf,
    #[serde(default)]
    pub expanded: BTreeSet<PathBuf>,
}

impl WorkspaceSession {
    /// A fresh session, with only the root expanded.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut expanded = BTreeSet::new();
        expanded.insert(root.clone());
        Self { root, expanded }
    }

    /// Reuse `saved` if it belongs to `root`, otherwise start fresh.
    pub fn resume(saved: Option<WorkspaceSession>, root: &Path) -> Self {
        match saved {
            Some(session) if session.root == root => session,
            _ => Self::new(root),
        }
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.contains(path)
    }

    /// Mark a directory expanded. Returns `true` if it was collapsed before.
    pub fn expand(&mut self, path: &Path) -> bool {
        self.expanded.insert(path.to_path_buf())
    }

    /// Mark a directory collapsed. Returns `true` if it was expanded before.
    pub fn collapse(&mut self, path: &Path) -> bool {
        self.expanded.remove(path)
    }

    /// Expanded directories strictly below `root`, shallowest first.
    pub fn expanded_below(&self, root: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .expanded
            .iter()
            .filter(|p| p.starts_with(root) && p.as_path() != root)
            .cloned()
            .collect();
        paths.sort_by_key(|p| p.components().count());
        paths
    }

    /// Move every expanded path under `from` to the same place under `to`.
    pub fn rekey(&mut self, from: &Path, to: &Path) {
        let moved: Vec<PathBuf> = self
            .expanded
            .iter()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            self.expanded.remove(&old);
            if let Ok(relative) = old.strip_prefix(from) {
                let new = if relative.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(relative)
                };
                self.expanded.insert(new);
            }
        }
    }

    /// Drop `path` and everything below it.
    pub fn forget(&mut self, path: &Path) {
        self.expanded.retain(|p| !p.starts_with(path));
    }
}

/// Key-value collaborator that persists the session between runs.
pub trait SessionStore: Send + Sync {
    /// The last saved session, if any.
    fn load<'a>(&'a self) -> BoxFuture<'a, Result<Option<WorkspaceSession>>>;

    /// Persist `session`, replacing the previous one.
    fn save<'a>(&'a self, session: &'a WorkspaceSession) -> BoxFuture<'a, Result<()>>;
}

/// Session store that keeps one JSON document on an [`AsyncFileSystem`].
pub struct FsSessionStore<FS> {
    fs: FS,
    path: PathBuf,
}

impl<FS: AsyncFileSystem> FsSessionStore<FS> {
    pub fn new(fs: FS, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    /// Location of the session document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default session document next to the config file
/// (`~/.config/treesync/session.json`).
#[cfg(not(target_arch = "wasm32"))]
pub fn default_session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("treesync").join("session.json"))
}

impl<FS: AsyncFileSystem> SessionStore for FsSessionStore<FS> {
    fn load<'a>(&'a self) -> BoxFuture<'a, Result<Option<WorkspaceSession>>> {
        Box::pin(async move {
            if !self.fs.exists(&self.path).await {
                return Ok(None);
            }
            let contents =
                self.fs
                    .read_to_string(&self.path)
                    .await
                    .map_err(|source| TreeSyncError::FileRead {
                        path: self.path.clone(),
                        source,
                    })?;
            let session: WorkspaceSession = serde_json::from_str(&contents)?;
            debug!(
                "Loaded session for {:?} ({} expanded)",
                session.root,
                session.expanded.len()
            );
            Ok(Some(session))
        })
    }

    fn save<'a>(&'a self, session: &'a WorkspaceSession) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let contents = serde_json::to_string_pretty(session)?;
            self.fs
                .write_file(&self.path, &contents)
                .await
                .map_err(|source| TreeSyncError::FileWrite {
                    path: self.path.clone(),
                    source,
                })
        })
    }
}
