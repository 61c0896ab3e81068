//! Workspace tree synchronization and ordering engine.
//!
//! `treesync_core` mirrors a directory tree in memory the way a file explorer
//! needs it: directories load lazily on expansion, a poll-based watcher
//! reloads the tree when its structure drifts on disk, drag-and-drop moves
//! are validated before any I/O, and user-sortable records are kept in order
//! with fractional positions so a move rewrites one record.
//!
//! Entry points:
//! - [`workspace::WorkspaceTree`] for loading, expanding and mutating the tree
//! - [`watcher::ChangeWatcher`] for drift detection
//! - [`ordering::OrderedCollection`] for append/reorder

/// Configuration options
pub mod config;

/// Tree entries (the public snapshot type)
pub mod entry;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction and tree events
pub mod fs;

/// Fractional ordering of records
pub mod ordering;

/// Drag-and-drop moves
pub mod reparent;

/// Quick-open search over loaded files
pub mod search;

/// Expanded-folder state, persisted between runs
pub mod session;

/// Tree store, directory loader and structural hash
pub mod tree;

/// Poll-based change watcher
pub mod watcher;

/// Workspace tree facade
pub mod workspace;

#[cfg(test)]
pub mod test_utils;

pub use entry::Entry;
pub use error::{ErrorKind, Result, SerializableError, TreeSyncError};
pub use reparent::MoveOutcome;
pub use watcher::{ChangeWatcher, TickOutcome, WatcherState};
pub use workspace::WorkspaceTree;
