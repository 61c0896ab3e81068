//! Native filesystem implementation.
//!
//! Only available on non-WASM targets.

use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind, Result, Write};
use std::path::{Path, PathBuf};

use super::FileSystem;

#[derive(Clone, Copy, Debug, Default)]
/// This is a simple filesystem implementation that simply maps to std::fs methods
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        // This atomic check prevents race conditions
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(content.as_bytes())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("Path does not exist: {:?}", dir),
            ));
        }
        if !dir.is_dir() {
            return Err(Error::new(
                ErrorKind::NotADirectory,
                format!("Not a directory: {:?}", dir),
            ));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        if !from.exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("Source not found: {:?}", from),
            ));
        }
        if to.exists() {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Destination already exists: {:?}", to),
            ));
        }

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::rename(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_dir_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        fs.write_file(&dir.path().join("a.txt"), "a").unwrap();
        fs.create_dir_all(&dir.path().join("sub")).unwrap();

        let mut listed = fs.list_dir(dir.path()).unwrap();
        listed.sort();
        assert_eq!(listed, vec![dir.path().join("a.txt"), dir.path().join("sub")]);

        let err = fs.list_dir(&dir.path().join("a.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
        let err = fs.list_dir(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_move_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        fs.write_file(&dir.path().join("a.txt"), "a").unwrap();
        fs.write_file(&dir.path().join("b/a.txt"), "b").unwrap();

        let err = fs
            .move_file(&dir.path().join("a.txt"), &dir.path().join("b/a.txt"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs.read_to_string(&dir.path().join("b/a.txt")).unwrap(), "b");
    }
}
