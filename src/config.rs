//! User configuration.
//!
//! A small `key=value` file holding the default roots, whether hidden folders
//! are skipped, and the worker count. The file is created with defaults on
//! first run (or migrated from the tool's previous config location).
//!
//! ```text
//! path=/home/me/src
//! path=/home/me/work
//! exclude_hidden=false
//! max_workers=8
//! ```

use std::path::Path;

use anyhow::Context;

pub mod ignore;
pub mod path;

pub use ignore::{IgnoreList, is_ignored};
pub use path::{CONFIG_DIR_ENV, ConfigPaths};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub paths: Vec<String>,
    pub exclude_hidden: bool,
    pub max_workers: usize,
}

impl ScanConfig {
    /// Defaults for this machine: the current directory, hidden folders
    /// included, one worker per available CPU.
    pub fn defaults() -> Self {
        let cwd = std::env::current_dir()
            .map(|cwd| cwd.display().to_string())
            .unwrap_or_else(|_| ".".to_string());
        let max_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            paths: vec![cwd],
            exclude_hidden: false,
            max_workers,
        }
    }

    pub fn to_file_contents(&self) -> String {
        let mut out = String::new();
        for path in &self.paths {
            out.push_str(&format!("path={path}\n"));
        }
        out.push_str(&format!("exclude_hidden={}\n", self.exclude_hidden));
        out.push_str(&format!("max_workers={}\n", self.max_workers));
        out
    }

    pub fn write(&self, file: &Path) -> anyhow::Result<()> {
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(file, self.to_file_contents())
            .with_context(|| format!("failed to write {}", file.display()))
    }
}

/// Parse a boolean-like config value (case-insensitive).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split config text into trimmed `(key, value)` pairs, in file order.
///
/// Blank lines, `#` comments, and lines without `=` are skipped.
pub fn parse_lines(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Apply parsed values over `defaults`. Unknown keys and invalid values are
/// ignored; without any `path=` entry the default paths are kept.
pub fn coerce(values: &[(String, String)], defaults: &ScanConfig) -> ScanConfig {
    let mut config = ScanConfig {
        paths: Vec::new(),
        ..defaults.clone()
    };

    for (key, value) in values {
        match key.as_str() {
            "path" if !value.is_empty() => config.paths.push(value.clone()),
            "exclude_hidden" => {
                if let Some(parsed) = parse_bool(value) {
                    config.exclude_hidden = parsed;
                }
            }
            "max_workers" => {
                if value.bytes().all(|b| b.is_ascii_digit())
                    && let Ok(n) = value.parse::<usize>()
                    && n > 0
                {
                    config.max_workers = n;
                }
            }
            _ => log::debug!("Ignoring config key {key:?}"),
        }
    }

    if config.paths.is_empty() {
        config.paths = defaults.paths.clone();
    }
    config
}

fn read_values(file: &Path) -> anyhow::Result<Option<Vec<(String, String)>>> {
    match std::fs::read_to_string(file) {
        Ok(content) => Ok(Some(parse_lines(&content))),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", file.display())),
    }
}

/// Load the config, creating it on first run.
///
/// When the config file does not exist it is seeded from the legacy file if
/// present, else from `defaults`. A failed write is returned to the caller
/// alongside the usable config so it can be reported without aborting.
pub fn load_or_init(
    paths: &ConfigPaths,
    defaults: &ScanConfig,
) -> anyhow::Result<(ScanConfig, Option<anyhow::Error>)> {
    if let Some(values) = read_values(&paths.config_file)? {
        return Ok((coerce(&values, defaults), None));
    }

    let legacy = match &paths.legacy_config_file {
        Some(file) => read_values(file)?,
        None => None,
    };
    let config = match legacy {
        Some(values) => {
            log::info!(
                "Migrating legacy config to {}",
                paths.config_file.display()
            );
            coerce(&values, defaults)
        }
        None => defaults.clone(),
    };

    let write_error = config.write(&paths.config_file).err();
    Ok((config, write_error))
}
