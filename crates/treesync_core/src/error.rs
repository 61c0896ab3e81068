use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for treesync operations
#[derive(Debug, Error)]
pub enum TreeSyncError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load directory '{path}': {source}")]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete '{path}': {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to move '{from}' to '{to}': {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    // Tree errors
    #[error("Cannot move '{dragged}' into itself or its children ('{target}')")]
    InvalidMove { dragged: PathBuf, target: PathBuf },

    #[error("Invalid entry name '{0}'")]
    InvalidName(String),

    #[error("Operation not allowed on the workspace root '{0}'")]
    ProtectedRoot(PathBuf),

    #[error("Entry not found: '{0}'")]
    NotFound(PathBuf),

    // Ordering errors
    #[error("Record not found: '{0}'")]
    RecordNotFound(String),

    #[error("Failed to persist order change: {0}")]
    Persistence(String),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // Config / session errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Session (de)serialization error: {0}")]
    Session(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for treesync operations
pub type Result<T> = std::result::Result<T, TreeSyncError>;

/// Failure category, as reported to users and IPC consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Filesystem unavailable, missing path, permission denied.
    Io,
    /// Cycle or otherwise impossible move.
    InvalidMove,
    /// Storage write for a position/order update failed.
    Persistence,
    /// A path or record id is no longer present.
    NotFound,
    /// Configuration or session state could not be (de)serialized.
    Config,
}

impl TreeSyncError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeSyncError::Io(_)
            | TreeSyncError::ListDir { .. }
            | TreeSyncError::FileRead { .. }
            | TreeSyncError::FileWrite { .. }
            | TreeSyncError::Create { .. }
            | TreeSyncError::Delete { .. }
            | TreeSyncError::Move { .. } => ErrorKind::Io,
            TreeSyncError::InvalidMove { .. }
            | TreeSyncError::InvalidName(_)
            | TreeSyncError::ProtectedRoot(_) => ErrorKind::InvalidMove,
            TreeSyncError::NotFound(_) | TreeSyncError::RecordNotFound(_) => ErrorKind::NotFound,
            TreeSyncError::Persistence(_) => ErrorKind::Persistence,
            #[cfg(feature = "sqlite")]
            TreeSyncError::Sqlite(_) => ErrorKind::Persistence,
            TreeSyncError::ConfigParse(_)
            | TreeSyncError::ConfigSerialize(_)
            | TreeSyncError::Session(_)
            | TreeSyncError::NoConfigDir => ErrorKind::Config,
        }
    }

    /// Underlying `std::io::ErrorKind`, if this is a filesystem failure.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TreeSyncError::Io(source)
            | TreeSyncError::ListDir { source, .. }
            | TreeSyncError::FileRead { source, .. }
            | TreeSyncError::FileWrite { source, .. }
            | TreeSyncError::Create { source, .. }
            | TreeSyncError::Delete { source, .. }
            | TreeSyncError::Move { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

/// A serializable representation of TreeSyncError for IPC (e.g., Tauri)
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&TreeSyncError> for SerializableError {
    fn from(err: &TreeSyncError) -> Self {
        let path = match err {
            TreeSyncError::ListDir { path, .. }
            | TreeSyncError::FileRead { path, .. }
            | TreeSyncError::FileWrite { path, .. }
            | TreeSyncError::Create { path, .. }
            | TreeSyncError::Delete { path, .. }
            | TreeSyncError::NotFound(path)
            | TreeSyncError::ProtectedRoot(path) => Some(path.clone()),
            TreeSyncError::Move { from, .. } => Some(from.clone()),
            TreeSyncError::InvalidMove { dragged, .. } => Some(dragged.clone()),
            _ => None,
        };

        Self {
            kind: err.kind(),
            message: err.to_string(),
            path,
        }
    }
}

impl From<TreeSyncError> for SerializableError {
    fn from(err: TreeSyncError) -> Self {
        SerializableError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_kind_taxonomy() {
        let err = TreeSyncError::ListDir {
            path: PathBuf::from("/ws"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));

        let err = TreeSyncError::InvalidMove {
            dragged: PathBuf::from("/ws/b"),
            target: PathBuf::from("/ws/b/sub"),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidMove);
        assert_eq!(err.io_kind(), None);

        assert_eq!(
            TreeSyncError::RecordNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TreeSyncError::Persistence("disk full".into()).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn test_serializable_error_carries_path() {
        let err = TreeSyncError::Move {
            from: PathBuf::from("/ws/a.txt"),
            to: PathBuf::from("/ws/b/a.txt"),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
        };
        let ser = err.to_serializable();
        assert_eq!(ser.kind, ErrorKind::Io);
        assert_eq!(ser.path, Some(PathBuf::from("/ws/a.txt")));
        assert!(ser.message.contains("/ws/b/a.txt"));
    }
}
