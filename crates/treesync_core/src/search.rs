//! Quick-open search over the files currently loaded in a tree.
//!
//! Only loaded entries are searched; unexpanded directories are not walked.
//! A query matches when its characters appear in the file name in order,
//! ignoring case (`"rdm"` matches `README.md`).

use std::path::{Path, PathBuf};

use serde::Serialize;
use ts_rs::TS;

use crate::entry::Entry;

/// One searchable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FileMatch {
    /// File name
    pub name: String,
    /// Full path of the file
    pub path: PathBuf,
    /// Directory containing the file
    pub folder: PathBuf,
}

impl FileMatch {
    /// Folder relative to `root` for display; `/` for files directly in the root.
    pub fn display_folder(&self, root: &Path) -> String {
        match self.folder.strip_prefix(root) {
            Ok(relative) if relative.as_os_str().is_empty() => "/".to_string(),
            Ok(relative) => format!("/{}", relative.to_string_lossy()),
            Err(_) => self.folder.to_string_lossy().into_owned(),
        }
    }
}

/// Flatten the loaded files of `root`, depth-first in stored order.
pub fn flatten_files(root: &Entry) -> Vec<FileMatch> {
    let mut result = Vec::new();
    collect(root, &root.path, &mut result);
    result
}

fn collect(entry: &Entry, folder: &Path, result: &mut Vec<FileMatch>) {
    if !entry.is_dir {
        result.push(FileMatch {
            name: entry.name.clone(),
            path: entry.path.clone(),
            folder: folder.to_path_buf(),
        });
        return;
    }
    for child in entry.children.iter().flatten() {
        collect(child, &entry.path, result);
    }
}

/// Case-insensitive in-order subsequence test.
pub fn is_subsequence(query: &str, candidate: &str) -> bool {
    let mut wanted = query.chars().flat_map(char::to_lowercase).peekable();
    for c in candidate.chars().flat_map(char::to_lowercase) {
        if wanted.peek() == Some(&c) {
            wanted.next();
        }
    }
    wanted.peek().is_none()
}

/// Filter `files` by `query`; a blank query returns everything.
pub fn filter_files(files: &[FileMatch], query: &str) -> Vec<FileMatch> {
    let query = query.trim();
    if query.is_empty() {
        return files.to_vec();
    }
    files
        .iter()
        .filter(|f| is_subsequence(query, &f.name))
        .cloned()
        .collect()
}
