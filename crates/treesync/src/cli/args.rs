//! Command-line argument structures and enums

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use treesync_core::ordering::Collection;

#[derive(Parser)]
#[command(name = "treesync")]
#[command(version)]
#[command(about = "Browse, watch and reorganize a workspace tree", long_about = None)]
pub struct Cli {
    /// Override workspace location
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the workspace tree as currently expanded
    Tree {
        /// Reveal these paths (and expand their folders) before printing
        #[arg(short, long)]
        expand: Vec<PathBuf>,

        /// Collapse these folders before printing
        #[arg(short, long)]
        collapse: Vec<PathBuf>,
    },

    /// Quick-open search over the loaded files
    Find {
        /// Characters to match, in order, against file names
        query: String,
    },

    /// Move a file or folder into another folder
    #[command(alias = "mv")]
    Move {
        /// Entry to move
        path: PathBuf,

        /// Destination folder
        target: PathBuf,
    },

    /// Create an empty file (or folder with --folder)
    New {
        /// Folder to create in
        parent: PathBuf,

        /// Name of the new entry
        name: String,

        /// Create a folder instead of a file
        #[arg(short, long)]
        folder: bool,
    },

    /// Rename an entry in place
    Rename {
        path: PathBuf,

        /// New file or folder name
        name: String,
    },

    /// Delete a file or folder
    #[command(alias = "rm")]
    Delete {
        path: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Poll the workspace and report structural changes until Ctrl+C
    Watch {
        /// Poll interval in milliseconds (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Manage user-ordered records
    Order {
        #[command(subcommand)]
        command: OrderCommands,

        /// Order database (default: ~/.config/treesync/order.db)
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Which ordered collection to operate on.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CollectionArg {
    #[default]
    Items,
    Categories,
}

impl From<CollectionArg> for Collection {
    fn from(arg: CollectionArg) -> Self {
        match arg {
            CollectionArg::Items => Collection::Items,
            CollectionArg::Categories => Collection::Categories,
        }
    }
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Add a record at the end of a collection
    Append {
        name: String,

        /// Opaque payload stored with the record (e.g. a path)
        #[arg(short, long, default_value = "")]
        payload: String,

        #[arg(short, long, value_enum, default_value_t)]
        collection: CollectionArg,
    },

    /// List records in display order
    List {
        #[arg(short, long, value_enum, default_value_t)]
        collection: CollectionArg,

        /// Only records in this category (id)
        #[arg(long, conflicts_with = "uncategorized")]
        category: Option<String>,

        /// Only records in no category
        #[arg(long)]
        uncategorized: bool,
    },

    /// Move a record to a new index
    Move {
        id: String,

        /// Zero-based destination index
        index: usize,

        #[arg(short, long, value_enum, default_value_t)]
        collection: CollectionArg,

        /// Reorder within this category only
        #[arg(long)]
        category: Option<String>,
    },

    /// Put a record into a category
    Assign { id: String, category: String },

    /// Take a record out of a category
    Unassign { id: String, category: String },

    /// Respace a collection's positions evenly
    Renormalize {
        #[arg(short, long, value_enum, default_value_t)]
        collection: CollectionArg,
    },

    /// Delete a record
    Remove { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value
    Set {
        /// One of: default_root, poll_interval_ms, pause_when_unfocused,
        /// show_hidden, detect_repositories, position_gap
        key: String,
        value: String,
    },
}
