//! In-memory filesystem, available on all targets.
//!
//! Used by the test suite and by embedders that want to drive the tree engine
//! without touching disk.

use std::collections::{HashMap, HashSet};
use std::io::{Error, ErrorKind, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::FileSystem;

/// In-memory filesystem. Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    /// Files stored as path -> content
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
    /// Directories that exist (implicitly created when files are added)
    directories: Arc<RwLock<HashSet<PathBuf>>>,
}

impl InMemoryFileSystem {
    /// Create a new empty in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem pre-populated with files.
    ///
    /// All parent directories are created implicitly.
    pub fn with_files(entries: Vec<(PathBuf, String)>) -> Self {
        let fs = Self::new();
        {
            let mut files = write(&fs.files);
            let mut dirs = write(&fs.directories);

            for (path, content) in entries {
                let path = Self::normalize_path(&path);
                insert_ancestors(&mut dirs, &path);
                files.insert(path, content);
            }
        }
        fs
    }

    /// Get a list of all file paths in the filesystem
    pub fn list_all_files(&self) -> Vec<PathBuf> {
        read(&self.files).keys().cloned().collect()
    }

    /// Clear all files and directories
    pub fn clear(&self) {
        write(&self.files).clear();
        write(&self.directories).clear();
    }

    /// Helper to normalize paths (remove . and .. components where possible)
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    components.pop();
                }
                c => components.push(c),
            }
        }
        components.iter().collect()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn insert_ancestors(dirs: &mut HashSet<PathBuf>, path: &Path) {
    let mut current = path;
    while let Some(parent) = current.parent() {
        if parent.as_os_str().is_empty() {
            break;
        }
        dirs.insert(parent.to_path_buf());
        current = parent;
    }
}

fn not_found(path: &Path) -> Error {
    Error::new(ErrorKind::NotFound, format!("Not found: {:?}", path))
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let normalized = Self::normalize_path(path);
        read(&self.files)
            .get(&normalized)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);
        if read(&self.directories).contains(&normalized) {
            return Err(Error::new(
                ErrorKind::IsADirectory,
                format!("Is a directory: {:?}", path),
            ));
        }

        if let Some(parent) = normalized.parent() {
            self.create_dir_all(parent)?;
        }

        write(&self.files).insert(normalized, content.to_string());
        Ok(())
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        if self.exists(path) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Already exists: {:?}", path),
            ));
        }
        self.write_file(path, content)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        match write(&self.files).remove(&normalized) {
            Some(_) => Ok(()),
            None => Err(not_found(path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut dirs = write(&self.directories);
        if !dirs.contains(&normalized) {
            return Err(not_found(path));
        }
        dirs.retain(|d| !d.starts_with(&normalized));
        write(&self.files).retain(|f, _| !f.starts_with(&normalized));
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let normalized = Self::normalize_path(dir);
        let files = read(&self.files);
        let dirs = read(&self.directories);

        if !dirs.contains(&normalized) {
            if files.contains_key(&normalized) {
                return Err(Error::new(
                    ErrorKind::NotADirectory,
                    format!("Not a directory: {:?}", dir),
                ));
            }
            return Err(not_found(dir));
        }

        let is_child = |p: &&PathBuf| p.parent() == Some(normalized.as_path());
        Ok(files
            .keys()
            .filter(is_child)
            .chain(dirs.iter().filter(is_child))
            .cloned()
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        read(&self.files).contains_key(&normalized) || read(&self.directories).contains(&normalized)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        if read(&self.files).contains_key(&normalized) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("A file exists at {:?}", path),
            ));
        }

        let mut dirs = write(&self.directories);
        if !normalized.as_os_str().is_empty() {
            dirs.insert(normalized.clone());
        }
        insert_ancestors(&mut dirs, &normalized);
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        read(&self.directories).contains(&normalized)
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        let from_norm = Self::normalize_path(from);
        let to_norm = Self::normalize_path(to);

        if from_norm == to_norm {
            return Ok(());
        }
        if !self.exists(&from_norm) {
            return Err(not_found(from));
        }
        if self.exists(&to_norm) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Destination already exists: {:?}", to),
            ));
        }

        let mut files = write(&self.files);
        let mut dirs = write(&self.directories);

        if dirs.contains(&from_norm) {
            if to_norm.starts_with(&from_norm) {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Cannot move {:?} into itself", from),
                ));
            }

            // Relocate every file and directory under the source prefix
            let moved_files: Vec<PathBuf> = files
                .keys()
                .filter(|p| p.starts_with(&from_norm))
                .cloned()
                .collect();
            for old in moved_files {
                if let Some(content) = files.remove(&old)
                    && let Ok(relative) = old.strip_prefix(&from_norm)
                {
                    files.insert(to_norm.join(relative), content);
                }
            }

            let moved_dirs: Vec<PathBuf> = dirs
                .iter()
                .filter(|d| d.starts_with(&from_norm))
                .cloned()
                .collect();
            for old in moved_dirs {
                dirs.remove(&old);
                if let Ok(relative) = old.strip_prefix(&from_norm) {
                    dirs.insert(to_norm.join(relative));
                }
            }
        } else if let Some(content) = files.remove(&from_norm) {
            files.insert(to_norm.clone(), content);
        }

        insert_ancestors(&mut dirs, &to_norm);
        Ok(())
    }
}
