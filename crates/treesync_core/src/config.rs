//! Engine configuration.
//!
//! [`EngineConfig`] holds the tunables of the tree engine and the ordering
//! allocator. It is persisted as TOML (typically at
//! `~/.config/treesync/config.toml` on Unix systems); every field has a
//! default, so a partial or missing file is fine.
//!
//! Use [`EngineConfig::load_from`] with an `AsyncFileSystem`, or the `_sync`
//! wrappers from synchronous code.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeSyncError};
use crate::fs::{AsyncFileSystem, FileSystem, SyncToAsyncFs};
use crate::ordering::POSITION_GAP;

/// Default watcher poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Workspace opened when none is given explicitly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_root: Option<PathBuf>,

    /// How often the change watcher re-lists the root
    pub poll_interval_ms: u64,

    /// Stop polling while the host window is unfocused
    pub pause_when_unfocused: bool,

    /// Include entries whose name starts with `.`
    pub show_hidden: bool,

    /// Flag directories containing a `.git` child as version-controlled
    pub detect_repositories: bool,

    /// Spacing between appended positions
    pub position_gap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_root: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            pause_when_unfocused: true,
            show_hidden: false,
            detect_repositories: true,
            position_gap: POSITION_GAP,
        }
    }
}

impl EngineConfig {
    /// Poll interval as a `Duration` (never zero).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Position gap, falling back to the default for non-positive or non-finite values.
    pub fn gap(&self) -> f64 {
        if self.position_gap.is_finite() && self.position_gap > 0.0 {
            self.position_gap
        } else {
            POSITION_GAP
        }
    }

    /// Load config from a specific path using an AsyncFileSystem.
    pub async fn load_from<FS: AsyncFileSystem + ?Sized>(fs: &FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .await
            .map_err(|e| TreeSyncError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: EngineConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path using an AsyncFileSystem.
    pub async fn save_to<FS: AsyncFileSystem + ?Sized>(&self, fs: &FS, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs.create_dir_all(parent)
                .await
                .map_err(|source| TreeSyncError::Create {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)
            .await
            .map_err(|source| TreeSyncError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    /// Load config from an AsyncFileSystem, returning defaults if the file is missing.
    ///
    /// A file that exists but does not parse is still an error.
    pub async fn load_from_or_default<FS: AsyncFileSystem + ?Sized>(
        fs: &FS,
        path: &Path,
    ) -> Result<Self> {
        if !fs.exists(path).await {
            return Ok(Self::default());
        }
        Self::load_from(fs, path).await
    }

    /// Sync wrapper for [`EngineConfig::load_from_or_default`].
    pub fn load_from_or_default_sync<FS: FileSystem>(fs: FS, path: &Path) -> Result<Self> {
        futures_lite::future::block_on(Self::load_from_or_default(&SyncToAsyncFs::new(fs), path))
    }

    /// Sync wrapper for [`EngineConfig::save_to`].
    pub fn save_to_sync<FS: FileSystem>(&self, fs: FS, path: &Path) -> Result<()> {
        futures_lite::future::block_on(self.save_to(&SyncToAsyncFs::new(fs), path))
    }
}

// ============================================================================
// Native-only default location
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl EngineConfig {
    /// Get the config file path (~/.config/treesync/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("treesync").join("config.toml"))
    }

    /// Load config from the default location, or return defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from_or_default_sync(crate::fs::RealFileSystem, &path),
            None => Ok(Self::default()),
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(TreeSyncError::NoConfigDir)?;
        self.save_to_sync(crate::fs::RealFileSystem, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFileSystem, block_on_test};

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert!(config.pause_when_unfocused);
        assert!(!config.show_hidden);
        assert!(config.detect_repositories);
        assert_eq!(config.gap(), 200.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let fs = SyncToAsyncFs::new(InMemoryFileSystem::with_files(vec![(
            PathBuf::from("/cfg/config.toml"),
            "poll_interval_ms = 500\nshow_hidden = true\n".to_string(),
        )]));
        let config = block_on_test(EngineConfig::load_from(&fs, Path::new("/cfg/config.toml"))).unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert!(config.show_hidden);
        assert!(config.pause_when_unfocused);
        assert_eq!(config.position_gap, 200.0);
    }

    #[test]
    fn test_missing_file_is_default_but_garbage_is_error() {
        let fs = SyncToAsyncFs::new(InMemoryFileSystem::new());
        let config =
            block_on_test(EngineConfig::load_from_or_default(&fs, Path::new("/cfg/none.toml")))
                .unwrap();
        assert_eq!(config, EngineConfig::default());

        fs.inner()
            .write_file(Path::new("/cfg/bad.toml"), "poll_interval_ms = \"soon\"")
            .unwrap();
        let err = block_on_test(EngineConfig::load_from_or_default(&fs, Path::new("/cfg/bad.toml")))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_save_and_reload() {
        let fs = InMemoryFileSystem::new();
        let config = EngineConfig {
            default_root: Some(PathBuf::from("/ws")),
            position_gap: 1000.0,
            ..EngineConfig::default()
        };
        config.save_to_sync(&fs, Path::new("/cfg/treesync/config.toml")).unwrap();

        let loaded =
            EngineConfig::load_from_or_default_sync(&fs, Path::new("/cfg/treesync/config.toml"))
                .unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_gap_falls_back_for_invalid_values() {
        let config = EngineConfig {
            position_gap: -5.0,
            ..EngineConfig::default()
        };
        assert_eq!(config.gap(), POSITION_GAP);
    }
}
