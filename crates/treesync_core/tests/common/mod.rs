//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use treesync_core::config::EngineConfig;
use treesync_core::fs::{FileSystem, InMemoryFileSystem, SyncToAsyncFs};
use treesync_core::session::WorkspaceSession;
use treesync_core::workspace::WorkspaceTree;

/// Collaborator calls that touch the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(PathBuf),
    Move(PathBuf, PathBuf),
    Other(&'static str, PathBuf),
}

/// In-memory filesystem that logs what the engine asks of it.
#[derive(Clone, Default)]
pub struct LoggingFs {
    pub inner: InMemoryFileSystem,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl LoggingFs {
    pub fn with_files(paths: &[&str]) -> Self {
        Self {
            inner: InMemoryFileSystem::with_files(
                paths
                    .iter()
                    .map(|p| (PathBuf::from(p), String::new()))
                    .collect(),
            ),
            calls: Arc::default(),
        }
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.inner.create_dir_all(Path::new(path)).unwrap();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl FileSystem for LoggingFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.log(Call::Other("read", path.to_path_buf()));
        self.inner.read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        self.log(Call::Other("write", path.to_path_buf()));
        self.inner.write_file(path, content)
    }

    fn create_new(&self, path: &Path, content: &str) -> io::Result<()> {
        self.log(Call::Other("create", path.to_path_buf()));
        self.inner.create_new(path, content)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        self.log(Call::Other("delete", path.to_path_buf()));
        self.inner.delete_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.log(Call::Other("delete", path.to_path_buf()));
        self.inner.remove_dir_all(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.log(Call::List(dir.to_path_buf()));
        self.inner.list_dir(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.log(Call::Other("mkdir", path.to_path_buf()));
        self.inner.create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.log(Call::Move(from.to_path_buf(), to.to_path_buf()));
        self.inner.move_file(from, to)
    }
}

pub type TestTree = WorkspaceTree<SyncToAsyncFs<LoggingFs>>;

/// A tree over `fs` rooted at `/ws`, not yet loaded.
pub fn workspace(fs: &LoggingFs) -> TestTree {
    WorkspaceTree::new(
        SyncToAsyncFs::new(fs.clone()),
        WorkspaceSession::new("/ws"),
        &EngineConfig::default(),
    )
}

pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    futures_lite::future::block_on(future)
}
