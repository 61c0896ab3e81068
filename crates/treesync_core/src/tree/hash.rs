//! Order-independent structural fingerprints of entry trees.
//!
//! The digest is the sorted list of `"{path}:{dir|file}"` keys for every known
//! node, joined with `|`. Unloaded directories contribute only their own key.
//! It is a cheap drift detector, not a cryptographic hash.

use crate::entry::Entry;

const SEPARATOR: &str = "|";

fn node_key(entry: &Entry) -> String {
    let kind = if entry.is_dir { "dir" } else { "file" };
    format!("{}:{}", entry.path.to_string_lossy(), kind)
}

fn collect_keys(entry: &Entry, keys: &mut Vec<String>) {
    keys.push(node_key(entry));
    for child in entry.children.iter().flatten() {
        collect_keys(child, keys);
    }
}

/// Hash a listing (a sequence of sibling entries and whatever is loaded below them).
pub fn structural_hash<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut keys = Vec::new();
    for entry in entries {
        collect_keys(entry, &mut keys);
    }
    keys.sort();
    keys.join(SEPARATOR)
}

/// Hash a subtree, including its root node.
pub fn subtree_hash(entry: &Entry) -> String {
    structural_hash(std::iter::once(entry))
}
