//! Ignore list: paths excluded from every scan.
//!
//! One entry per line; blank lines and `#` comments are skipped. Entries may
//! be absolute, `~`-relative, or relative to the root being scanned.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::path::{absolutize, canonicalize_best_effort, expand_tilde};

/// Raw ignore entries as read from the ignore file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    entries: Vec<String>,
}

impl IgnoreList {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        Self { entries }
    }

    /// Load from `path`; a missing file is an empty list.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every entry against `base` into absolute, normalized paths.
    ///
    /// Entries that exist are canonicalized so they compare equal to the
    /// canonical folder paths produced during enumeration.
    pub fn resolve(&self, base: &Path) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter_map(|entry| match expand_tilde(entry) {
                Ok(expanded) => Some(expanded),
                Err(e) => {
                    log::warn!("Skipping ignore entry {entry:?}: {e:#}");
                    None
                }
            })
            .map(|expanded| canonicalize_best_effort(&absolutize(&expanded, base)))
            .collect()
    }
}

/// True when `path` equals or lies beneath any of `ignored`, comparing whole
/// path components (`/a/bc` is not under `/a/b`).
pub fn is_ignored(path: &Path, ignored: &[PathBuf]) -> bool {
    ignored.iter().any(|ignored| path.starts_with(ignored))
}
