//! Directory loader: one directory's immediate children, never recursive.

use std::path::Path;

use log::debug;

use crate::config::EngineConfig;
use crate::entry::{Entry, entry_name};
use crate::error::{Result, TreeSyncError};
use crate::fs::AsyncFileSystem;

/// Marker whose presence flags a directory as version-controlled.
const REPOSITORY_MARKER: &str = ".git";

/// Lists directories through an [`AsyncFileSystem`].
#[derive(Debug, Clone, Copy)]
pub struct DirectoryLoader {
    show_hidden: bool,
    detect_repositories: bool,
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self {
            show_hidden: false,
            detect_repositories: true,
        }
    }
}

impl DirectoryLoader {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            show_hidden: config.show_hidden,
            detect_repositories: config.detect_repositories,
        }
    }

    /// List the immediate children of `path`.
    ///
    /// Directories come first, then files, each group ordered by name. Every
    /// returned directory is unloaded (`children == None`). Fails with
    /// [`TreeSyncError::ListDir`] when the path is missing, is not a directory,
    /// or cannot be read.
    pub async fn list<FS>(&self, fs: &FS, path: &Path) -> Result<Vec<Entry>>
    where
        FS: AsyncFileSystem + ?Sized,
    {
        let paths = fs
            .list_dir(path)
            .await
            .map_err(|source| TreeSyncError::ListDir {
                path: path.to_path_buf(),
                source,
            })?;

        let mut entries = Vec::with_capacity(paths.len());
        for child in paths {
            let name = entry_name(&child);
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }

            let is_dir = fs.is_dir(&child).await;
            let is_version_controlled = if is_dir && self.detect_repositories {
                Some(fs.exists(&child.join(REPOSITORY_MARKER)).await)
            } else {
                None
            };

            entries.push(Entry {
                name,
                path: child,
                is_dir,
                children: None,
                is_version_controlled,
            });
        }

        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        debug!("Listed {} entries in {:?}", entries.len(), path);
        Ok(entries)
    }
}
