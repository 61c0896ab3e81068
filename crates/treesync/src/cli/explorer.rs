//! Tree browsing and file operations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use treesync_core::MoveOutcome;
use treesync_core::entry::format_tree;
use treesync_core::reparent::IgnoredReason;

use crate::cli::{CliTree, block_on, resolve_path};

/// Handle the tree command
/// Returns true on success, false on error
pub fn handle_tree(tree: &CliTree, expand: Vec<PathBuf>, collapse: Vec<PathBuf>) -> bool {
    let root = tree.root();
    let mut ok = true;

    for path in collapse {
        block_on(tree.collapse(&resolve_path(&root, &path)));
    }
    for path in expand {
        let path = resolve_path(&root, &path);
        // Revealing a folder shows its ancestors; expand it too so its
        // children are listed
        if block_on(tree.reveal(&path)).is_err() {
            ok = false;
            continue;
        }
        if tree.find(&path).is_some_and(|e| e.is_dir) && block_on(tree.expand(&path)).is_err() {
            ok = false;
        }
    }

    print!("{}", format_tree(&tree.tree(), ""));
    ok
}

/// Handle the find command
pub fn handle_find(tree: &CliTree, query: &str) -> bool {
    let root = tree.root();
    let matches = tree.search(query);
    if matches.is_empty() {
        println!("No loaded files match '{}'", query);
        return true;
    }
    for m in matches {
        println!("{:<32} {}", m.name, m.display_folder(&root));
    }
    true
}

/// Handle the move command
pub fn handle_move(tree: &CliTree, path: &Path, target: &Path) -> bool {
    let root = tree.root();
    let path = resolve_path(&root, path);
    let target = resolve_path(&root, target);

    // Both ends must be loaded before a drop can be planned
    if block_on(tree.reveal(&path)).is_err() || block_on(tree.reveal(&target)).is_err() {
        return false;
    }

    match block_on(tree.move_entry(&path, &target)) {
        Ok(MoveOutcome::Moved { from, to }) => {
            println!("✓ Moved {} → {}", from.display(), to.display());
            true
        }
        Ok(MoveOutcome::Ignored { reason }) => {
            let why = match reason {
                IgnoredReason::SameEntry => "source and target are the same",
                IgnoredReason::TargetNotDirectory => "target is not a folder",
                IgnoredReason::AlreadyInTarget => "already in that folder",
            };
            println!("Nothing to do: {}", why);
            true
        }
        Err(_) => false,
    }
}

/// Handle the new command
pub fn handle_new(tree: &CliTree, parent: &Path, name: &str, folder: bool) -> bool {
    let parent = resolve_path(&tree.root(), parent);
    if block_on(tree.reveal(&parent)).is_err() {
        return false;
    }

    let created = if folder {
        block_on(tree.create_folder(&parent, name))
    } else {
        block_on(tree.create_file(&parent, name))
    };
    match created {
        Ok(path) => {
            println!("✓ Created {}", path.display());
            true
        }
        Err(_) => false,
    }
}

/// Handle the rename command
pub fn handle_rename(tree: &CliTree, path: &Path, name: &str) -> bool {
    let path = resolve_path(&tree.root(), path);
    if block_on(tree.reveal(&path)).is_err() {
        return false;
    }
    match block_on(tree.rename(&path, name)) {
        Ok(new_path) => {
            println!("✓ Renamed to {}", new_path.display());
            true
        }
        Err(_) => false,
    }
}

/// Handle the delete command
pub fn handle_delete(tree: &CliTree, path: &Path, yes: bool) -> bool {
    let path = resolve_path(&tree.root(), path);
    if block_on(tree.reveal(&path)).is_err() {
        return false;
    }

    if !yes && !confirm(&format!("Delete {}?", path.display())) {
        println!("Cancelled.");
        return true;
    }

    match block_on(tree.delete(&path)) {
        Ok(()) => {
            println!("✓ Deleted {}", path.display());
            true
        }
        Err(_) => false,
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
