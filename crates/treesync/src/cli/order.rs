//! `order` command handlers.

use std::path::PathBuf;

use treesync_core::config::EngineConfig;
use treesync_core::ordering::{
    Collection, ListFilter, OrderStore, OrderedCollection, PositionAllocator, RecordDraft,
    SqliteOrderStore,
};

use crate::cli::args::OrderCommands;

/// Default order database (~/.config/treesync/order.db)
fn default_db_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("treesync").join("order.db"))
}

fn open_store(db: Option<PathBuf>) -> Option<SqliteOrderStore> {
    let Some(path) = db.or_else(default_db_path) else {
        eprintln!("✗ Could not determine config directory");
        return None;
    };
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        eprintln!("✗ Could not create {}: {}", parent.display(), e);
        return None;
    }
    match SqliteOrderStore::open(&path) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("✗ Could not open {}: {}", path.display(), e);
            None
        }
    }
}

/// Handle order subcommands.
/// Returns true on success, false on error
pub fn handle_order_command(command: OrderCommands, db: Option<PathBuf>, config: &EngineConfig) -> bool {
    let Some(store) = open_store(db) else {
        return false;
    };
    let collection = OrderedCollection::new(store, PositionAllocator::from_config(config));

    let result = match command {
        OrderCommands::Append {
            name,
            payload,
            collection: which,
        } => collection
            .append(which.into(), RecordDraft::new(name).with_payload(payload))
            .map(|record| {
                println!("✓ Added '{}' at {} ({})", record.name, record.position, record.id);
            }),

        OrderCommands::List {
            collection: which,
            category,
            uncategorized,
        } => {
            let filter = match (category, uncategorized) {
                (Some(id), _) => ListFilter::InCategory(id),
                (None, true) => ListFilter::Uncategorized,
                (None, false) => ListFilter::All,
            };
            collection.list(which.into(), &filter).map(|records| {
                if records.is_empty() {
                    println!("(empty)");
                }
                for (index, record) in records.iter().enumerate() {
                    println!(
                        "{:>3}. {:<24} {:>10}  {}",
                        index, record.name, record.position, record.id
                    );
                }
            })
        }

        OrderCommands::Move {
            id,
            index,
            collection: which,
            category,
        } => {
            let filter = category.map_or(ListFilter::All, ListFilter::InCategory);
            collection
                .reorder_within(which.into(), &filter, &id, index)
                .map(|position| println!("✓ Moved to index {} (position {})", index, position))
        }

        OrderCommands::Assign { id, category } => collection
            .store()
            .assign_category(&id, &category)
            .map(|()| println!("✓ Assigned")),

        OrderCommands::Unassign { id, category } => collection
            .store()
            .unassign_category(&id, &category)
            .map(|removed| {
                if removed {
                    println!("✓ Unassigned");
                } else {
                    println!("Record was not in that category");
                }
            }),

        OrderCommands::Renormalize { collection: which } => {
            let which: Collection = which.into();
            collection.renormalize(which).map(|records| {
                println!("✓ Respaced {} record(s) in {}", records.len(), which);
            })
        }

        OrderCommands::Remove { id } => collection.remove(&id).map(|removed| {
            if removed {
                println!("✓ Removed {}", id);
            } else {
                println!("No record {}", id);
            }
        }),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
