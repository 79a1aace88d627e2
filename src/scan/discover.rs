//! Folder enumeration: builds the ordered scan list from the resolved roots.
//!
//! Only immediate subfolders of a root are entries. When another root lies
//! inside the folder being listed, its children are spliced in directly after
//! the entry that contains it, with their display names prefixed by a tree
//! marker.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::Entry;
use crate::config::{IgnoreList, is_ignored};
use crate::path::top_level_roots;

/// Prefix for entries reached through a nested root.
pub const NESTED_MARKER: &str = "└─ ";

/// Immediate subfolders of `base`, sorted case-insensitively by name.
///
/// Symlinks are never followed, so a symlink to a directory is skipped.
/// Hidden folders are skipped unless `include_hidden`; anything equal to or
/// beneath an `ignored` path is skipped regardless.
pub fn list_subfolders(
    base: &Path,
    include_hidden: bool,
    ignored: &[PathBuf],
) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let read_dir =
        std::fs::read_dir(base).with_context(|| format!("failed to read {}", base.display()))?;

    let mut folders = Vec::new();
    for dir_entry in read_dir {
        let dir_entry =
            dir_entry.with_context(|| format!("failed to read {}", base.display()))?;
        let is_dir = dir_entry
            .file_type()
            .map(|file_type| file_type.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }

        let path = dir_entry.path();
        if is_ignored(&path, ignored) {
            log::debug!("Ignoring {}", path.display());
            continue;
        }

        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if !include_hidden && name.starts_with('.') {
            continue;
        }
        folders.push((name, path));
    }

    folders.sort_by_cached_key(|(name, _)| name.to_lowercase());
    Ok(folders)
}

/// Build the full scan list for `roots`.
///
/// `roots` must already be canonical and deduplicated. Roots nested inside
/// another root are not listed on their own; they are reached through the
/// folder that contains them.
pub fn build_scan_list(
    roots: &[PathBuf],
    include_hidden: bool,
    ignore: &IgnoreList,
) -> anyhow::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for root in top_level_roots(roots) {
        append_folder(&root, "", roots, include_hidden, ignore, &mut entries)?;
    }
    Ok(entries)
}

fn append_folder(
    base: &Path,
    prefix: &str,
    roots: &[PathBuf],
    include_hidden: bool,
    ignore: &IgnoreList,
    entries: &mut Vec<Entry>,
) -> anyhow::Result<()> {
    let ignored = ignore.resolve(base);
    for (name, path) in list_subfolders(base, include_hidden, &ignored)? {
        entries.push(Entry::new(format!("{prefix}{name}"), path.clone()));

        if roots.contains(&path) {
            let nested_prefix = format!("{prefix}{NESTED_MARKER}");
            append_folder(&path, &nested_prefix, roots, include_hidden, ignore, entries)?;
        }
    }
    Ok(())
}
