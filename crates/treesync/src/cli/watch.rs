//! `watch` command: poll the workspace until Ctrl+C.

use std::sync::Arc;

use treesync_core::ChangeWatcher;
use treesync_core::config::EngineConfig;
use treesync_core::fs::TreeEvent;

use crate::cli::CliTree;

/// Handle the watch command
/// Returns true on success, false on error
pub fn handle_watch(tree: CliTree, mut config: EngineConfig, interval: Option<u64>) -> bool {
    if let Some(ms) = interval {
        config.poll_interval_ms = ms;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("✗ Failed to create Tokio runtime: {}", e);
            return false;
        }
    };

    let root = tree.root();
    tree.events().subscribe(Arc::new(|event: &TreeEvent| match event {
        // The first poll has nothing to compare against
        TreeEvent::DriftDetected {
            previous: Some(_), ..
        } => println!("~ Structure changed, reloading"),
        TreeEvent::BranchReloaded { path } => log::debug!("Reloaded {}", path.display()),
        _ => {}
    }));

    let watcher = ChangeWatcher::new(tree, &config);
    println!(
        "Watching {} every {:?} (Ctrl+C to stop)",
        root.display(),
        config.poll_interval()
    );

    runtime.block_on(async {
        let handle = watcher.spawn();
        match tokio::signal::ctrl_c().await {
            Ok(()) => println!("\nStopping watcher..."),
            Err(e) => eprintln!("✗ Failed to listen for Ctrl+C: {}", e),
        }
        handle.stop().await;
    });

    println!("Watcher stopped.");
    true
}
