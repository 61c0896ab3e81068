//! Tree engine events.
//!
//! The engine never renders anything itself. Everything a UI would want to
//! react to (branch reloads, detected drift, completed moves, user-facing
//! notices such as a rejected cyclic drop) is reported as a [`TreeEvent`]
//! through a [`CallbackRegistry`](super::CallbackRegistry).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Events emitted by the tree engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type")]
pub enum TreeEvent {
    /// A transient, user-visible message (the "toast" channel).
    Notice {
        level: NoticeLevel,
        message: String,
    },

    /// The children of a directory were re-read and patched into the tree.
    BranchReloaded {
        /// Directory whose children were replaced.
        path: PathBuf,
    },

    /// The watcher saw the structural hash change since its last poll.
    DriftDetected {
        /// Root directory being watched.
        root: PathBuf,
        /// Hash before the change (`None` on the first poll).
        #[serde(default)]
        previous: Option<String>,
        /// Hash that triggered the reload.
        current: String,
    },

    /// An entry was moved into another directory.
    EntryMoved {
        /// Path before the move.
        from: PathBuf,
        /// Path after the move.
        to: PathBuf,
    },

    /// A file or directory was created.
    EntryCreated {
        path: PathBuf,
        is_dir: bool,
    },

    /// An entry was renamed within its directory.
    EntryRenamed {
        old_path: PathBuf,
        new_path: PathBuf,
    },

    /// An entry was deleted.
    EntryDeleted {
        path: PathBuf,
    },
}

impl TreeEvent {
    /// Create an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Create a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Create an info notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Get the primary path affected by this event, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::BranchReloaded { path }
            | Self::EntryCreated { path, .. }
            | Self::EntryDeleted { path } => Some(path),
            Self::DriftDetected { root, .. } => Some(root),
            Self::EntryMoved { to, .. } => Some(to),
            Self::EntryRenamed { new_path, .. } => Some(new_path),
            Self::Notice { .. } => None,
        }
    }

    /// Get the event type name as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Notice { .. } => "Notice",
            Self::BranchReloaded { .. } => "BranchReloaded",
            Self::DriftDetected { .. } => "DriftDetected",
            Self::EntryMoved { .. } => "EntryMoved",
            Self::EntryCreated { .. } => "EntryCreated",
            Self::EntryRenamed { .. } => "EntryRenamed",
            Self::EntryDeleted { .. } => "EntryDeleted",
        }
    }

    /// Whether this is a notice at error level.
    pub fn is_error_notice(&self) -> bool {
        matches!(
            self,
            Self::Notice {
                level: NoticeLevel::Error,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = TreeEvent::EntryMoved {
            from: PathBuf::from("/ws/a.txt"),
            to: PathBuf::from("/ws/b/a.txt"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"EntryMoved\""));

        let parsed: TreeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_notice_shape() {
        let json = serde_json::to_value(TreeEvent::error("Cannot move")).unwrap();
        assert_eq!(json["type"], "Notice");
        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "Cannot move");
    }

    #[test]
    fn test_path_and_type() {
        let event = TreeEvent::BranchReloaded {
            path: PathBuf::from("/ws/b"),
        };
        assert_eq!(event.path(), Some(&PathBuf::from("/ws/b")));
        assert_eq!(event.event_type(), "BranchReloaded");
        assert_eq!(TreeEvent::info("x").path(), None);
        assert!(!TreeEvent::warning("x").is_error_notice());
        assert!(TreeEvent::error("x").is_error_notice());
    }
}
