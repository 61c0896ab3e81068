//! In-memory mirror of one filesystem root.
//!
//! Nodes live in a flat map keyed by path; the hierarchical [`Entry`] view is
//! derived from it and cached per node as an `Arc`. Patching one directory's
//! children rebuilds views only for that directory and its ancestors, so every
//! other subtree keeps the same `Arc` (and UI state keyed by path or by
//! identity is undisturbed).

mod hash;
mod loader;

pub use hash::{structural_hash, subtree_hash};
pub use loader::DirectoryLoader;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::entry::{Entry, entry_name};

#[derive(Debug, Clone)]
struct Node {
    name: String,
    is_dir: bool,
    is_version_controlled: Option<bool>,
    children: Option<Vec<PathBuf>>,
}

/// Arena-backed tree for a single root.
#[derive(Debug, Clone)]
pub struct TreeStore {
    root: PathBuf,
    nodes: HashMap<PathBuf, Node>,
    views: HashMap<PathBuf, Arc<Entry>>,
}

impl TreeStore {
    /// Create a store whose root directory is not loaded yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut store = Self {
            root: root.clone(),
            nodes: HashMap::new(),
            views: HashMap::new(),
        };
        store.nodes.insert(
            root.clone(),
            Node {
                name: entry_name(&root),
                is_dir: true,
                is_version_controlled: None,
                children: None,
            },
        );
        store.refresh_view(&root);
        store
    }

    /// Root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot of the whole tree.
    pub fn tree(&self) -> Arc<Entry> {
        match self.views.get(&self.root) {
            Some(view) => Arc::clone(view),
            None => Arc::new(Entry::dir(self.root.clone())),
        }
    }

    /// Snapshot of the subtree at `path`, if it is known.
    pub fn get(&self, path: &Path) -> Option<Arc<Entry>> {
        self.views.get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// `Some(is_dir)` for known paths.
    pub fn is_dir(&self, path: &Path) -> Option<bool> {
        self.nodes.get(path).map(|n| n.is_dir)
    }

    /// Whether `path` is a known directory whose children have been listed.
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.nodes
            .get(path)
            .is_some_and(|n| n.children.is_some())
    }

    /// Paths of the immediate children of a loaded directory.
    pub fn child_paths(&self, path: &Path) -> Option<&[PathBuf]> {
        self.nodes.get(path)?.children.as_deref()
    }

    /// Number of known nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Replace the root's immediate children wholesale.
    pub fn set_root_children(&mut self, entries: Vec<Entry>) {
        let root = self.root.clone();
        self.patch_children(&root, entries);
    }

    /// Replace the children of the directory at `parent`.
    ///
    /// Unknown paths and files are ignored; returns whether anything was
    /// patched. An incoming directory that arrives unloaded keeps the already
    /// loaded subtree of the node it replaces (same path, still a directory),
    /// so a reload of a parent does not collapse its expanded descendants.
    pub fn patch_children(&mut self, parent: &Path, entries: Vec<Entry>) -> bool {
        match self.nodes.get(parent) {
            Some(node) if node.is_dir => {}
            Some(_) => {
                debug!("Ignoring patch of file node {:?}", parent);
                return false;
            }
            None => {
                debug!("Ignoring patch of unknown node {:?}", parent);
                return false;
            }
        }

        let mut seen = HashSet::new();
        let mut new_children = Vec::with_capacity(entries.len());
        for entry in entries {
            // A node can never be its own descendant
            if parent.starts_with(&entry.path) || !seen.insert(entry.path.clone()) {
                continue;
            }
            new_children.push(entry.path.clone());
            self.merge_entry(entry);
        }

        let stale: Vec<PathBuf> = self
            .nodes
            .get(parent)
            .and_then(|n| n.children.as_ref())
            .map(|old| {
                old.iter()
                    .filter(|p| !seen.contains(*p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for path in stale {
            self.remove_subtree(&path);
        }

        let count = new_children.len();
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = Some(new_children);
        }

        self.refresh_view(parent);
        self.refresh_ancestors(parent);
        debug!("Patched {:?} with {} children", parent, count);
        true
    }

    /// Insert or update one incoming entry (and whatever it carries below it).
    ///
    /// An unloaded incoming entry of the same kind as the existing node keeps
    /// that node, its loaded descendants, and its cached view.
    fn merge_entry(&mut self, entry: Entry) {
        let keep_existing = entry.children.is_none()
            && self
                .nodes
                .get(&entry.path)
                .is_some_and(|n| n.is_dir == entry.is_dir);

        if keep_existing {
            let changed = match self.nodes.get_mut(&entry.path) {
                Some(node)
                    if node.name != entry.name
                        || node.is_version_controlled != entry.is_version_controlled =>
                {
                    node.name = entry.name;
                    node.is_version_controlled = entry.is_version_controlled;
                    true
                }
                _ => false,
            };
            if changed {
                self.refresh_view(&entry.path);
            }
            return;
        }

        self.remove_subtree(&entry.path);
        self.insert_subtree(&entry);
    }

    fn insert_subtree(&mut self, entry: &Entry) {
        let children = entry.children.as_ref().map(|children| {
            let mut paths = Vec::with_capacity(children.len());
            for child in children {
                if !paths.contains(&child.path) {
                    paths.push(child.path.clone());
                    self.insert_subtree(child);
                }
            }
            paths
        });

        self.nodes.insert(
            entry.path.clone(),
            Node {
                name: entry.name.clone(),
                is_dir: entry.is_dir,
                is_version_controlled: entry.is_version_controlled,
                children: if entry.is_dir { children } else { None },
            },
        );
        self.refresh_view(&entry.path);
    }

    fn remove_subtree(&mut self, path: &Path) {
        let Some(node) = self.nodes.remove(path) else {
            return;
        };
        self.views.remove(path);
        for child in node.children.iter().flatten() {
            self.remove_subtree(child);
        }
    }

    /// Rebuild the cached view of one node from its children's views.
    fn refresh_view(&mut self, path: &Path) {
        let Some(node) = self.nodes.get(path) else {
            return;
        };
        let children = node.children.as_ref().map(|paths| {
            paths
                .iter()
                .filter_map(|p| self.views.get(p).cloned())
                .collect()
        });
        let view = Entry {
            name: node.name.clone(),
            path: path.to_path_buf(),
            is_dir: node.is_dir,
            children,
            is_version_controlled: node.is_version_controlled,
        };
        self.views.insert(path.to_path_buf(), Arc::new(view));
    }

    fn refresh_ancestors(&mut self, path: &Path) {
        let mut current = path.to_path_buf();
        while current != self.root {
            let Some(parent) = current.parent().map(Path::to_path_buf) else {
                break;
            };
            if !self.nodes.contains_key(&parent) {
                break;
            }
            self.refresh_view(&parent);
            current = parent;
        }
    }
}
