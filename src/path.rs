//! Path helpers: home expansion, root resolution, and ancestry checks.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use normalize_path::NormalizePath;

use crate::git::ScanError;

pub fn home_dir() -> anyhow::Result<PathBuf> {
    home::home_dir()
        .filter(|home| !home.as_os_str().is_empty())
        .context("cannot determine home directory (set $HOME or $USERPROFILE)")
}

/// Expand a leading `~` or `~/` to the home directory.
///
/// `~user` forms are left untouched.
pub fn expand_tilde(raw: &str) -> anyhow::Result<PathBuf> {
    let Some(rest) = raw.strip_prefix('~') else {
        return Ok(PathBuf::from(raw));
    };

    if rest.is_empty() {
        return home_dir();
    }

    match rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\')) {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(raw)),
    }
}

/// Join `path` onto `base` when relative, then drop `.` and `..` lexically.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.normalize()
    } else {
        base.join(path).normalize()
    }
}

pub fn canonicalize_best_effort(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Format a filesystem path for user-facing output, replacing the home
/// directory prefix with `~`.
pub fn format_path_for_display(path: &Path) -> String {
    if let Ok(home) = home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Resolve user or config supplied root strings to canonical directories.
///
/// Blank entries are skipped, duplicates are removed keeping the first
/// occurrence, and any entry that is not an existing directory fails the
/// whole resolution with `ScanError::Config`.
pub fn resolve_roots(raw: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;

    let mut seen = HashSet::new();
    let mut roots = Vec::new();
    for entry in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let expanded = expand_tilde(entry)?;
        let absolute = absolutize(&expanded, &cwd);
        let canonical = match dunce::canonicalize(&absolute) {
            Ok(path) if path.is_dir() => path,
            _ => {
                return Err(ScanError::config(format!(
                    "Not a directory: {}",
                    format_path_for_display(&absolute)
                ))
                .into());
            }
        };
        if seen.insert(canonical.clone()) {
            roots.push(canonical);
        }
    }

    if roots.is_empty() {
        return Err(ScanError::config("At least one --path must be provided").into());
    }
    log::debug!("Resolved {} root(s): {:?}", roots.len(), roots);
    Ok(roots)
}

/// True when some *other* root is a strict ancestor of `path`.
pub fn has_ancestor(path: &Path, roots: &[PathBuf]) -> bool {
    roots
        .iter()
        .any(|root| root.as_path() != path && path.starts_with(root))
}

/// Roots that are not nested under another root, in input order.
pub fn top_level_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .filter(|root| !has_ancestor(root, roots))
        .cloned()
        .collect()
}
