//! Filesystem abstraction module.
//!
//! This module provides the `FileSystem` trait for abstracting the filesystem
//! collaborator the tree engine mirrors, allowing a real implementation and an
//! in-memory one (for tests and embedding).
//!
//! The engine itself only talks to [`AsyncFileSystem`]; wrap a synchronous
//! implementation with [`SyncToAsyncFs`] to use it there.
//!
//! ## Events
//!
//! - [`TreeEvent`]: what the engine reports to UI consumers (reloads, drift,
//!   moves, user-visible notices)
//! - [`CallbackRegistry`]: subscription registry those events are emitted through

mod async_fs;
mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod native;

mod callback_registry;
mod events;

pub use async_fs::{AsyncFileSystem, BoxFuture, SyncToAsyncFs};

#[cfg(test)]
pub(crate) use async_fs::block_on_test;
pub use memory::InMemoryFileSystem;
#[cfg(not(target_arch = "wasm32"))]
pub use native::RealFileSystem;

pub use callback_registry::{CallbackRegistry, EventCallback, SubscriptionId};
pub use events::{NoticeLevel, TreeEvent};

use std::io::Result;
use std::path::{Path, PathBuf};

/// Abstraction over filesystem operations
/// Allows for different implementations: real filesystem, in-memory, etc.
/// Send + Sync required for multi-threaded environments (e.g., Tauri)
pub trait FileSystem: Send + Sync {
    /// Reads the file content
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Overwrites a file with new content
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Creates a file ONLY if it doesn't exist.
    /// Should return an error if file exists.
    fn create_new(&self, path: &Path, content: &str) -> Result<()>;

    /// Deletes a file
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Deletes a directory and everything below it
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Lists the immediate children (files and directories) of a directory.
    ///
    /// Fails with `NotFound` when the path does not exist and with
    /// `NotADirectory` when it is not a directory.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Checks if a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Checks if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Move/rename a file or directory from `from` to `to`.
    ///
    /// Implementations should treat this as an atomic-ish move when possible,
    /// and should error if the source does not exist or if the destination already exists.
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (*self).read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file(path, content)
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        (*self).create_new(path, content)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        (*self).delete_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        (*self).remove_dir_all(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (*self).list_dir(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (*self).create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (*self).is_dir(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        (*self).move_file(from, to)
    }
}
