//! The shared value type for one node of a mirrored hierarchy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One file or directory in the mirrored tree.
///
/// `children` is load-state, not content-state: `None` means the directory has
/// not been listed yet, `Some(vec![])` means it was listed and is empty. Files
/// never carry children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Entry {
    /// Display label (last path segment)
    pub name: String,
    /// Identity key, unique within a root
    pub path: PathBuf,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Immediate children, when loaded
    #[serde(default)]
    pub children: Option<Vec<Arc<Entry>>>,
    /// Provenance flag (e.g. the directory is a git checkout)
    #[serde(default)]
    pub is_version_controlled: Option<bool>,
}

impl Entry {
    /// An unloaded directory entry.
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: entry_name(&path),
            path,
            is_dir: true,
            children: None,
            is_version_controlled: None,
        }
    }

    /// A file entry.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: entry_name(&path),
            path,
            is_dir: false,
            children: None,
            is_version_controlled: None,
        }
    }

    /// Builder-style helper that marks a directory as loaded with `children`.
    pub fn with_children(mut self, children: Vec<Entry>) -> Self {
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    /// Whether this directory's children have been listed.
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// Depth-first lookup of `path` in this subtree.
    pub fn find(&self, path: &Path) -> Option<&Entry> {
        if self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children
            .as_ref()?
            .iter()
            .find_map(|child| child.find(path))
    }

    /// Child with the given name, if loaded.
    pub fn child(&self, name: &str) -> Option<&Arc<Entry>> {
        self.children.as_ref()?.iter().find(|c| c.name == name)
    }

    /// Names of the immediate children, in stored order.
    pub fn child_names(&self) -> Vec<&str> {
        self.children
            .iter()
            .flatten()
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Last path segment as a display label.
///
/// Falls back to the whole path for roots like `/`.
pub fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Helper function to format an entry tree for display.
///
/// Unloaded directories are marked with a trailing `/…`, loaded ones with `/`.
pub fn format_tree(entry: &Entry, prefix: &str) -> String {
    let mut result = String::new();

    result.push_str(&entry.name);
    if entry.is_dir {
        result.push_str(if entry.is_loaded() { "/" } else { "/…" });
    }
    if entry.is_version_controlled == Some(true) {
        result.push_str(" [git]");
    }
    result.push('\n');

    let children = entry.children.as_deref().unwrap_or_default();
    for (i, child) in children.iter().enumerate() {
        let is_last_child = i == children.len() - 1;
        let connector = if is_last_child {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last_child { "    " } else { "│   " };

        result.push_str(prefix);
        result.push_str(connector);
        result.push_str(&format_tree(child, &format!("{}{}", prefix, child_prefix)));
    }

    result
}
