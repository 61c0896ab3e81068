//! Test utilities for treesync_core
//!
//! [`RecordingFs`] wraps an [`InMemoryFileSystem`], logs every mutating or
//! listing call the engine makes, and can be told to fail specific
//! operations on specific paths.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::fs::{FileSystem, InMemoryFileSystem};

/// A collaborator call observed by [`RecordingFs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    List(PathBuf),
    Read(PathBuf),
    Write(PathBuf),
    Create(PathBuf),
    CreateDir(PathBuf),
    Delete(PathBuf),
    Move(PathBuf, PathBuf),
}

/// Operation class used for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    List,
    Read,
    Write,
    Create,
    Delete,
    Move,
}

#[derive(Default)]
struct Recorder {
    calls: Vec<FsCall>,
    failures: HashSet<(FsOp, PathBuf)>,
}

/// Recording, fault-injecting filesystem. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingFs {
    inner: InMemoryFileSystem,
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingFs {
    pub fn new(inner: InMemoryFileSystem) -> Self {
        Self {
            inner,
            recorder: Arc::default(),
        }
    }

    /// Build from file paths with empty content.
    pub fn with_files(paths: &[&str]) -> Self {
        Self::new(InMemoryFileSystem::with_files(
            paths
                .iter()
                .map(|p| (PathBuf::from(p), String::new()))
                .collect(),
        ))
    }

    /// Add an empty directory (builder pattern).
    pub fn with_dir(self, path: &str) -> Self {
        self.inner.create_dir_all(Path::new(path)).unwrap();
        self
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The wrapped filesystem, for out-of-band ("external process") changes.
    pub fn inner(&self) -> &InMemoryFileSystem {
        &self.inner
    }

    pub fn calls(&self) -> Vec<FsCall> {
        self.recorder().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.recorder().calls.clear();
    }

    /// Directories listed, in call order.
    pub fn listed(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FsCall::List(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Make `op` on `path` fail with `PermissionDenied` until cleared.
    pub fn fail(&self, op: FsOp, path: &str) {
        self.recorder().failures.insert((op, PathBuf::from(path)));
    }

    pub fn clear_failures(&self) {
        self.recorder().failures.clear();
    }

    fn record(&self, call: FsCall, op: FsOp, path: &Path) -> io::Result<()> {
        let mut recorder = self.recorder();
        recorder.calls.push(call);
        if recorder.failures.contains(&(op, path.to_path_buf())) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected failure for {:?}", path),
            ));
        }
        Ok(())
    }
}

impl FileSystem for RecordingFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.record(FsCall::Read(path.to_path_buf()), FsOp::Read, path)?;
        self.inner.read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        self.record(FsCall::Write(path.to_path_buf()), FsOp::Write, path)?;
        self.inner.write_file(path, content)
    }

    fn create_new(&self, path: &Path, content: &str) -> io::Result<()> {
        self.record(FsCall::Create(path.to_path_buf()), FsOp::Create, path)?;
        self.inner.create_new(path, content)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        self.record(FsCall::Delete(path.to_path_buf()), FsOp::Delete, path)?;
        self.inner.delete_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.record(FsCall::Delete(path.to_path_buf()), FsOp::Delete, path)?;
        self.inner.remove_dir_all(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.record(FsCall::List(dir.to_path_buf()), FsOp::List, dir)?;
        self.inner.list_dir(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.record(FsCall::CreateDir(path.to_path_buf()), FsOp::Create, path)?;
        self.inner.create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.record(
            FsCall::Move(from.to_path_buf(), to.to_path_buf()),
            FsOp::Move,
            from,
        )?;
        self.inner.move_file(from, to)
    }
}
