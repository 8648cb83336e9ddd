//! Override merging for `path:` tables.
//!
//! Merging is per key: each key the overlay mentions replaces the base entry
//! outright, including an explicit `false`. Keys the overlay does not mention
//! keep their base value.

use super::types::{PathKey, PathTable};
use std::path::Path;

/// Merge `overlay` into `base`, with `overlay` taking precedence per key.
///
/// # Example
/// ```
/// use cslrun_config::config::{merge_paths, PathTable};
///
/// let mut base = PathTable::new();
/// base.set("a", "/x");
/// base.set("b", "/y");
/// let mut overlay = PathTable::new();
/// overlay.set("b", "/z");
///
/// let merged = merge_paths(base, overlay);
/// assert_eq!(merged.get("a").unwrap().to_str(), Some("/x"));
/// assert_eq!(merged.get("b").unwrap().to_str(), Some("/z"));
/// ```
pub fn merge_paths(mut base: PathTable, overlay: PathTable) -> PathTable {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

/// Merge a project override's paths into the user paths and record its directory.
pub fn merge_override(base: PathTable, overlay: PathTable, override_dir: &Path) -> PathTable {
    let mut merged = merge_paths(base, overlay);
    merged.set(PathKey::ConfigDir, override_dir);
    merged
}
