/// Clap argument definitions
mod args;

/// `config` command handlers
mod config;

/// `order` command handlers
mod order;

/// `tree`, `find`, `move`, `new`, `rename`, `delete`
mod explorer;

/// `watch` command
mod watch;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use treesync_core::config::EngineConfig;
use treesync_core::fs::{NoticeLevel, RealFileSystem, SyncToAsyncFs, TreeEvent};
use treesync_core::session::{
    FsSessionStore, SessionStore, WorkspaceSession, default_session_path,
};
use treesync_core::workspace::WorkspaceTree;

/// Type alias for the async filesystem used throughout the CLI.
pub type AsyncFs = SyncToAsyncFs<RealFileSystem>;

/// Type alias for the workspace tree over the real filesystem.
pub type CliTree = WorkspaceTree<AsyncFs>;

/// Helper to run async operations in sync context
fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures_lite::future::block_on(f)
}

pub use args::Cli;
use args::Commands;

/// Main entry point for the CLI
pub fn run_cli() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let success = match cli.command {
        Commands::Config { command } => config::handle_config_command(command, config),
        Commands::Order { command, db } => order::handle_order_command(command, db, &config),
        command => {
            let root = match resolve_root(cli.workspace, &config) {
                Some(root) => root,
                None => {
                    eprintln!("✗ Could not determine workspace root");
                    std::process::exit(1);
                }
            };
            let tree = open_tree(&root, &config);
            // The failure itself is printed by the notice subscriber
            if block_on(tree.load_root()).is_err() {
                std::process::exit(1);
            }

            match command {
                Commands::Tree { expand, collapse } => explorer::handle_tree(&tree, expand, collapse),
                Commands::Find { query } => explorer::handle_find(&tree, &query),
                Commands::Move { path, target } => explorer::handle_move(&tree, &path, &target),
                Commands::New {
                    parent,
                    name,
                    folder,
                } => explorer::handle_new(&tree, &parent, &name, folder),
                Commands::Rename { path, name } => explorer::handle_rename(&tree, &path, &name),
                Commands::Delete { path, yes } => explorer::handle_delete(&tree, &path, yes),
                Commands::Watch { interval } => watch::handle_watch(tree, config, interval),
                Commands::Config { .. } | Commands::Order { .. } => unreachable!(),
            }
        }
    };

    if !success {
        std::process::exit(1);
    }
}

/// Workspace root: `--workspace`, then the configured default, then the
/// current directory.
fn resolve_root(workspace: Option<PathBuf>, config: &EngineConfig) -> Option<PathBuf> {
    let root = workspace
        .or_else(|| config.default_root.clone())
        .or_else(|| std::env::current_dir().ok())?;
    Some(std::fs::canonicalize(&root).unwrap_or(root))
}

/// Tree over `root`, resuming the saved session when it belongs to `root`.
fn open_tree(root: &Path, config: &EngineConfig) -> CliTree {
    let store = default_session_path()
        .map(|path| Arc::new(FsSessionStore::new(SyncToAsyncFs::new(RealFileSystem), path)));

    let saved = store
        .as_ref()
        .and_then(|store| match block_on(store.load()) {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("Ignoring unreadable session: {}", e);
                None
            }
        });

    let tree = WorkspaceTree::new(
        SyncToAsyncFs::new(RealFileSystem),
        WorkspaceSession::resume(saved, root),
        config,
    );
    // Every failed tree operation raises an error notice; print it once here
    tree.events().subscribe(Arc::new(|event: &TreeEvent| {
        if let TreeEvent::Notice { level, message } = event {
            match level {
                NoticeLevel::Error => eprintln!("✗ {}", message),
                NoticeLevel::Warning => eprintln!("! {}", message),
                NoticeLevel::Info => println!("{}", message),
            }
        }
    }));

    match store {
        Some(store) => tree.with_session_store(store),
        None => tree,
    }
}

/// Resolve a user-supplied path against the workspace root.
pub(crate) fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        let joined = root.join(path);
        std::fs::canonicalize(&joined).unwrap_or(joined)
    }
}
